// SPDX-License-Identifier: GPL-3.0-only

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};

use serde_json::{Value, json};
use smart_sys::{DiagnosticError, DiagnosticReport, DiagnosticSource, Result};
use smart_types::SelfTestKind;

/// Scripted diagnostic source recording every call.
///
/// Each device replays its reports in order; the last one repeats forever.
#[derive(Default)]
pub struct FakeSource {
    devices: Vec<String>,
    reports: RefCell<HashMap<String, VecDeque<Value>>>,
    broken: HashSet<String>,
    scan_fails: bool,
    calls: RefCell<Vec<String>>,
}

impl FakeSource {
    pub fn new(devices: &[&str]) -> Self {
        Self {
            devices: devices.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }

    pub fn with_reports(self, device: &str, reports: Vec<Value>) -> Self {
        self.reports
            .borrow_mut()
            .insert(device.to_string(), reports.into());
        self
    }

    /// Every smartctl call for `device` fails as if the device vanished.
    pub fn with_broken_device(mut self, device: &str) -> Self {
        self.broken.insert(device.to_string());
        self
    }

    pub fn with_failing_scan(mut self) -> Self {
        self.scan_fails = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.borrow().iter().filter(|c| c.as_str() == call).count()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    fn check_device(&self, device: &str, command: &str) -> Result<()> {
        if self.broken.contains(device) {
            return Err(DiagnosticError::CommandFailed {
                command: format!("smartctl {command} {device}"),
                code: 2,
                message: format!("{device}: No such device"),
            });
        }
        Ok(())
    }
}

impl DiagnosticSource for FakeSource {
    fn report(&self, device: &str) -> Result<DiagnosticReport> {
        self.record(format!("report {device}"));
        self.check_device(device, "--xall --json")?;

        let mut reports = self.reports.borrow_mut();
        let document = match reports.get_mut(device) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_default(),
            Some(queue) => queue.front().cloned().unwrap_or_default(),
            None => json!({}),
        };
        Ok(DiagnosticReport::new(document))
    }

    fn error_log(&self, device: &str) -> Result<String> {
        self.record(format!("error_log {device}"));
        self.check_device(device, "--log=selftest --log=error --log=xerror")?;
        Ok(format!("self-test log for {device}"))
    }

    fn refresh_health(&self, device: &str) -> Result<()> {
        self.record(format!("health {device}"));
        self.check_device(device, "--health --json")
    }

    fn start_self_test(&self, device: &str, kind: SelfTestKind) -> Result<()> {
        self.record(format!("test {kind} {device}"));
        self.check_device(device, "--test")
    }

    fn scan(&self) -> Result<Vec<String>> {
        self.record("scan".to_string());
        if self.scan_fails {
            return Err(DiagnosticError::Enumeration("smartctl --scan --json failed".into()));
        }
        Ok(self.devices.clone())
    }
}

pub const MODEL: &str = "SAMSUNG MZYLF128HCHP-000L2";
pub const CAPACITY_BYTES: u64 = 128035676160;
pub const NAME: &str = "SAMSUNG MZYLF128HCHP-000L2 - 119.2GB";

/// ATA report with a health verdict and an idle self-test.
pub fn ata_status(device: &str, model: &str, passed: bool) -> Value {
    json!({
        "device": { "name": device, "type": "sat", "protocol": "ATA" },
        "model_name": model,
        "user_capacity": { "blocks": 250069680, "bytes": CAPACITY_BYTES },
        "smart_status": { "passed": passed },
        "ata_smart_data": {
            "self_test": {
                "status": { "value": 0, "string": "completed without error", "passed": true },
                "polling_minutes": { "short": 2, "extended": 90 }
            }
        }
    })
}

/// ATA report mid self-test or after it finished.
pub fn ata_self_test(device: &str, in_progress: bool, passed: bool) -> Value {
    let status = if in_progress {
        json!({ "value": 249, "string": "in progress, 90% remaining", "remaining_percent": 90 })
    } else if passed {
        json!({ "value": 0, "string": "completed without error", "passed": true })
    } else {
        json!({ "value": 121, "string": "completed: read failure", "passed": false })
    };

    json!({
        "device": { "name": device, "type": "sat", "protocol": "ATA" },
        "model_name": MODEL,
        "user_capacity": { "bytes": CAPACITY_BYTES },
        "smart_status": { "passed": true },
        "ata_smart_data": {
            "self_test": {
                "status": status,
                "polling_minutes": { "short": 2, "extended": 90 }
            }
        }
    })
}

/// NVMe report; `result` is the newest self-test log entry's result code.
pub fn nvme_self_test(device: &str, current_operation: i64, result: Option<i64>) -> Value {
    let table: Vec<Value> = result
        .map(|value| json!({ "self_test_code": { "value": 1 }, "self_test_result": { "value": value } }))
        .into_iter()
        .collect();

    json!({
        "device": { "name": device, "type": "nvme", "protocol": "NVMe" },
        "model_name": "WDC WDS500G2B0C",
        "nvme_total_capacity": 500107862016u64,
        "smart_status": { "passed": true },
        "nvme_self_test_log": {
            "current_self_test_operation": { "value": current_operation },
            "table": table
        }
    })
}
