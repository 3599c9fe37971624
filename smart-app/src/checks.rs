// SPDX-License-Identifier: GPL-3.0-only

//! Status checks and self-tests over one or all devices
//!
//! Everything runs sequentially: one smartctl invocation at a time, one
//! device at a time. A self-test is polled until the device stops reporting
//! it as in progress; unless `max_polls` is configured there is no upper
//! bound on the number of polls.

use std::thread;
use std::time::Duration;

use smart_sys::{DiagnosticError, DiagnosticReport, DiagnosticSource, interpret};
use smart_types::{DeviceTestResult, SelfTestKind, TestResults, TestType};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::Settings;

#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Diagnostic(#[from] DiagnosticError),

    #[error("self-test on {device} still in progress after {polls} polls")]
    PollLimitReached { device: String, polls: u32 },
}

pub type Result<T> = std::result::Result<T, CheckError>;

/// Runs checks against a diagnostic source
pub struct Checker<'a, S: DiagnosticSource + ?Sized> {
    source: &'a S,
    settings: &'a Settings,
    sleep: Box<dyn Fn(Duration) + 'a>,
}

impl<'a, S: DiagnosticSource + ?Sized> Checker<'a, S> {
    pub fn new(source: &'a S, settings: &'a Settings) -> Self {
        Self {
            source,
            settings,
            sleep: Box::new(thread::sleep),
        }
    }

    /// Replace the blocking wait between self-test polls.
    pub fn with_sleep(mut self, sleep: impl Fn(Duration) + 'a) -> Self {
        self.sleep = Box::new(sleep);
        self
    }

    /// Overall health verdict for one device.
    pub fn status(&self, device: &str) -> Result<DeviceTestResult> {
        let report = self.source.report(device)?;
        let name = interpret::human_readable_name(&report);
        info!("Getting SMART status for {device} - {name}...");

        self.source.refresh_health(device)?;
        // Observe whatever the health command refreshed.
        let report = self.source.report(device)?;

        let passed = interpret::status_passed(&report);
        log_outcome(&report, passed);

        for breach in interpret::limit_breaches(&report, &self.settings.custom_alert_limits) {
            warn!(
                "{device}: {} is {} (alert limit {})",
                breach.metric, breach.value, breach.limit
            );
        }

        self.finish(device, name, passed, TestType::Status)
    }

    pub fn short(&self, device: &str) -> Result<DeviceTestResult> {
        self.self_test(device, SelfTestKind::Short)
    }

    pub fn long(&self, device: &str) -> Result<DeviceTestResult> {
        self.self_test(device, SelfTestKind::Long)
    }

    /// Start a self-test and poll until the device reports it finished.
    pub fn self_test(&self, device: &str, kind: SelfTestKind) -> Result<DeviceTestResult> {
        let report = self.source.report(device)?;
        let interval = interpret::poll_interval(&report, kind);
        let name = interpret::human_readable_name(&report);
        info!("Starting {kind} self-test for {device} - {name}...");

        self.source.start_self_test(device, kind)?;
        let minutes = interval.as_secs_f64() / 60.0;
        info!("Polling results every {minutes:.1} minutes");

        let mut polls: u32 = 0;
        let report = loop {
            (self.sleep)(interval);
            polls = polls.saturating_add(1);

            let report = self.source.report(device)?;
            if !interpret::self_test_in_progress(&report) {
                break report;
            }

            if let Some(limit) = self.settings.max_polls
                && polls >= limit
            {
                return Err(CheckError::PollLimitReached {
                    device: device.to_string(),
                    polls,
                });
            }
            info!("Test still in progress. Waiting another {minutes:.1} minutes");
        };

        let passed = interpret::self_test_passed(&report);
        log_outcome(&report, passed);

        self.finish(device, name, passed, kind.into())
    }

    pub fn status_all(&self) -> Result<TestResults> {
        self.run_all(TestType::Status, |device| self.status(device))
    }

    pub fn short_all(&self) -> Result<TestResults> {
        self.run_all(TestType::Short, |device| self.short(device))
    }

    pub fn long_all(&self) -> Result<TestResults> {
        self.run_all(TestType::Long, |device| self.long(device))
    }

    /// Scanned devices minus the configured exclusions, in scan order.
    pub fn devices(&self) -> Result<Vec<String>> {
        let devices = self
            .source
            .scan()?
            .into_iter()
            .filter(|device| {
                let excluded = self.settings.is_excluded(device);
                if excluded {
                    info!("Skipping excluded device {device}");
                }
                !excluded
            })
            .collect();
        Ok(devices)
    }

    /// Run `check` on every device in turn. A device whose check errors is
    /// recorded as failed and the run moves on.
    fn run_all<F>(&self, test_type: TestType, check: F) -> Result<TestResults>
    where
        F: Fn(&str) -> Result<DeviceTestResult>,
    {
        let devices = self.devices()?;
        if devices.is_empty() {
            warn!("No devices to check");
        }

        let results = devices
            .iter()
            .map(|device| {
                check(device.as_str()).unwrap_or_else(|e| {
                    error!("FAILED: {device} - {test_type} check could not run: {e}");
                    DeviceTestResult::new(
                        device.as_str(),
                        interpret::UNKNOWN,
                        false,
                        test_type,
                        e.to_string(),
                    )
                })
            })
            .collect();
        Ok(results)
    }

    fn finish(
        &self,
        device: &str,
        name: String,
        passed: bool,
        test_type: TestType,
    ) -> Result<DeviceTestResult> {
        let error_info = if passed {
            String::new()
        } else {
            self.source.error_log(device)?
        };
        Ok(DeviceTestResult::new(
            device, name, passed, test_type, error_info,
        ))
    }
}

fn log_outcome(report: &DiagnosticReport, passed: bool) {
    let device = interpret::device_identifier(report);
    let name = interpret::human_readable_name(report);
    if passed {
        info!("passed: {device} - {name}");
    } else {
        error!("FAILED: {device} - {name}");
    }
}
