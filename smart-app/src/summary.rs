// SPDX-License-Identifier: GPL-3.0-only

//! Run summaries

use smart_types::TestResults;
use tracing::{error, info};

use crate::notify::Severity;

/// "N of M checks passed"
pub fn summary_line(results: &TestResults) -> String {
    let failed = results.failures().count();
    let total = results.len();
    if failed == 0 {
        format!("{total} of {total} checks passed")
    } else {
        format!("{failed} of {total} checks FAILED")
    }
}

pub fn log_summary(results: &TestResults) {
    let line = summary_line(results);
    if results.passed() {
        info!("{line}");
    } else {
        error!("{line}");
    }
}

/// Summary table followed by the smartctl logs of every failed device.
pub fn summary_text(results: &TestResults) -> String {
    let mut text = results.as_table();

    for failure in results.failures() {
        let details = failure.human_readable_error_info.trim_end();
        if details.is_empty() {
            continue;
        }
        text.push_str(&format!(
            "\n\n{} - {} ({}):\n{}",
            failure.device, failure.human_readable_name, failure.test_type, details
        ));
    }

    text
}

/// Notification for a finished run: the summary text when checks ran, the
/// error chain when the run itself failed.
pub fn notification(outcome: Result<&TestResults, &anyhow::Error>) -> (String, Severity) {
    match outcome {
        Ok(results) if results.passed() => (summary_text(results), Severity::Info),
        Ok(results) => (summary_text(results), Severity::Error),
        Err(e) => (format!("smart-monitor run failed: {e:#}"), Severity::Error),
    }
}
