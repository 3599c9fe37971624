// SPDX-License-Identifier: GPL-3.0-only

//! Check outcomes

use serde::{Deserialize, Serialize};

use crate::TestType;
use crate::table::render_table;

const TABLE_HEADERS: [&str; 3] = ["Status", "Device", "Info"];

/// Outcome of one check on one device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceTestResult {
    /// Device path the check ran against (e.g. "/dev/sda")
    pub device: String,

    /// "<model> - <capacity>GB", as reported before the check ran
    pub human_readable_name: String,

    pub passed: bool,

    pub test_type: TestType,

    /// smartctl self-test/error log text; empty when the check passed
    #[serde(default)]
    pub human_readable_error_info: String,
}

impl DeviceTestResult {
    /// Build a result. Error details are only kept for failed checks.
    pub fn new(
        device: impl Into<String>,
        human_readable_name: impl Into<String>,
        passed: bool,
        test_type: TestType,
        human_readable_error_info: impl Into<String>,
    ) -> Self {
        Self {
            device: device.into(),
            human_readable_name: human_readable_name.into(),
            passed,
            test_type,
            human_readable_error_info: if passed {
                String::new()
            } else {
                human_readable_error_info.into()
            },
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.passed { "ok" } else { "FAILED" }
    }

    /// (status, device, name) as shown in the summary table
    pub fn as_table_row(&self) -> (&'static str, &str, &str) {
        (
            self.status_label(),
            self.device.as_str(),
            self.human_readable_name.as_str(),
        )
    }
}

/// Ordered outcomes of a run over several devices
///
/// Only constructible by folding results, so `passed()` is always the
/// logical AND of every contained result. An empty run passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestResults {
    passed: bool,
    results: Vec<DeviceTestResult>,
}

impl TestResults {
    pub fn new(results: Vec<DeviceTestResult>) -> Self {
        let passed = results.iter().all(|result| result.passed);
        Self { passed, results }
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn results(&self) -> &[DeviceTestResult] {
        &self.results
    }

    pub fn failures(&self) -> impl Iterator<Item = &DeviceTestResult> {
        self.results.iter().filter(|result| !result.passed)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn into_results(self) -> Vec<DeviceTestResult> {
        self.results
    }

    /// Aligned Status/Device/Info table
    pub fn as_table(&self) -> String {
        let rows: Vec<[&str; 3]> = self
            .results
            .iter()
            .map(|result| {
                let (status, device, name) = result.as_table_row();
                [status, device, name]
            })
            .collect();
        render_table(&TABLE_HEADERS, &rows)
    }
}

impl FromIterator<DeviceTestResult> for TestResults {
    fn from_iter<I: IntoIterator<Item = DeviceTestResult>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl From<DeviceTestResult> for TestResults {
    fn from(result: DeviceTestResult) -> Self {
        Self::new(vec![result])
    }
}
