// SPDX-License-Identifier: GPL-3.0-only

//! Verdicts derived from smartctl reports
//!
//! Reports vary by vendor and firmware, and any field may be missing. Every
//! function here falls back to a fixed default instead of failing:
//!
//! | value                 | default     |
//! |-----------------------|-------------|
//! | model / device name   | `"UNKNOWN"` |
//! | capacity              | -1 bytes    |
//! | health / test verdict | failed      |
//! | test in progress      | no          |
//! | poll interval         | 60 seconds  |

use std::collections::BTreeMap;
use std::time::Duration;

use smart_types::SelfTestKind;

use crate::{DiagnosticReport, ReportDialect};

pub const UNKNOWN: &str = "UNKNOWN";
pub const DEFAULT_POLL_SECONDS: u64 = 60;

const GIB: f64 = (1u64 << 30) as f64;
const MISSING_CAPACITY: f64 = -1.0;

const MODEL_NAME: &str = "/model_name";
const USER_CAPACITY_BYTES: &str = "/user_capacity/bytes";
const NVME_TOTAL_CAPACITY: &str = "/nvme_total_capacity";
const DEVICE_NAME: &str = "/device/name";
const SMART_STATUS_PASSED: &str = "/smart_status/passed";

const ATA_SELF_TEST_STATUS_STRING: &str = "/ata_smart_data/self_test/status/string";
const ATA_SELF_TEST_STATUS_PASSED: &str = "/ata_smart_data/self_test/status/passed";
const ATA_POLLING_MINUTES: &str = "/ata_smart_data/self_test/polling_minutes";
const ATA_ATTRIBUTES: &str = "/ata_smart_attributes/table";

const NVME_CURRENT_OPERATION: &str = "/nvme_self_test_log/current_self_test_operation/value";
const NVME_LATEST_RESULT: &str = "/nvme_self_test_log/table/0/self_test_result/value";
const NVME_HEALTH_LOG: &str = "/nvme_smart_health_information_log";

/// `"<model> - <capacity>GB"`, capacity in GiB with one decimal.
///
/// A report without any capacity renders as `-0.0GB`.
pub fn human_readable_name(report: &DiagnosticReport) -> String {
    let capacity_bytes = report
        .f64_field(USER_CAPACITY_BYTES)
        .filter(|bytes| *bytes != 0.0)
        .or_else(|| {
            report
                .f64_field(NVME_TOTAL_CAPACITY)
                .filter(|bytes| *bytes != 0.0)
        })
        .unwrap_or(MISSING_CAPACITY);
    let model = report.str_field(MODEL_NAME).unwrap_or(UNKNOWN);

    format!("{model} - {:.1}GB", capacity_bytes / GIB)
}

pub fn device_identifier(report: &DiagnosticReport) -> String {
    report.str_field(DEVICE_NAME).unwrap_or(UNKNOWN).to_string()
}

/// Overall health verdict (`smart_status.passed`).
pub fn status_passed(report: &DiagnosticReport) -> bool {
    report.bool_field(SMART_STATUS_PASSED).unwrap_or(false)
}

pub fn self_test_in_progress(report: &DiagnosticReport) -> bool {
    match report.dialect() {
        ReportDialect::Ata => report
            .str_field(ATA_SELF_TEST_STATUS_STRING)
            .is_some_and(|status| status.contains("in progress")),
        ReportDialect::Nvme => report
            .i64_field(NVME_CURRENT_OPERATION)
            .is_some_and(|operation| operation != 0),
    }
}

/// Verdict of the most recent self-test.
///
/// NVMe devices report a result code per log entry where 0 means the test
/// completed without error; the newest entry is first in the table.
pub fn self_test_passed(report: &DiagnosticReport) -> bool {
    match report.dialect() {
        ReportDialect::Ata => report
            .bool_field(ATA_SELF_TEST_STATUS_PASSED)
            .unwrap_or(false),
        ReportDialect::Nvme => report
            .i64_field(NVME_LATEST_RESULT)
            .is_some_and(|result| result == 0),
    }
}

/// Recommended seconds between polls of a running short self-test.
pub fn poll_interval_seconds(report: &DiagnosticReport) -> u64 {
    poll_interval_seconds_for(report, SelfTestKind::Short)
}

/// Recommended seconds between polls of a running self-test of `kind`.
///
/// Only ATA devices publish polling minutes. Intervals that round down to
/// zero seconds fall back to the default so polling never runs back to back.
pub fn poll_interval_seconds_for(report: &DiagnosticReport, kind: SelfTestKind) -> u64 {
    if report.dialect() != ReportDialect::Ata {
        return DEFAULT_POLL_SECONDS;
    }

    let pointer = format!("{ATA_POLLING_MINUTES}/{}", kind.polling_minutes_key());
    report
        .f64_field(&pointer)
        .map(|minutes| (minutes * 60.0).floor())
        .filter(|seconds| seconds.is_finite() && *seconds >= 1.0)
        .map_or(DEFAULT_POLL_SECONDS, |seconds| seconds as u64)
}

pub fn poll_interval(report: &DiagnosticReport, kind: SelfTestKind) -> Duration {
    Duration::from_secs(poll_interval_seconds_for(report, kind))
}

/// Current value of a named health metric.
///
/// ATA metrics are looked up by attribute name (e.g. `Reallocated_Sector_Ct`)
/// and yield the raw value; NVMe metrics are keys of the SMART/health log
/// (e.g. `media_errors`).
pub fn metric_value(report: &DiagnosticReport, metric: &str) -> Option<i64> {
    match report.dialect() {
        ReportDialect::Ata => report
            .array_field(ATA_ATTRIBUTES)?
            .iter()
            .find(|attribute| attribute.get("name").and_then(|name| name.as_str()) == Some(metric))?
            .pointer("/raw/value")?
            .as_i64(),
        ReportDialect::Nvme => report.field(NVME_HEALTH_LOG)?.get(metric)?.as_i64(),
    }
}

/// A health metric above its configured alert threshold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitBreach {
    pub metric: String,
    pub value: i64,
    pub limit: i64,
}

/// Metrics whose current value exceeds their limit, in metric-name order.
/// Metrics the report does not carry are skipped.
pub fn limit_breaches(report: &DiagnosticReport, limits: &BTreeMap<String, i64>) -> Vec<LimitBreach> {
    limits
        .iter()
        .filter_map(|(metric, &limit)| {
            let value = metric_value(report, metric)?;
            (value > limit).then(|| LimitBreach {
                metric: metric.clone(),
                value,
                limit,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn report(document: Value) -> DiagnosticReport {
        DiagnosticReport::new(document)
    }

    fn ata_self_test(status: Value) -> DiagnosticReport {
        report(json!({ "ata_smart_data": { "self_test": { "status": status } } }))
    }

    fn nvme_self_test_log(log: Value) -> DiagnosticReport {
        report(json!({ "nvme_self_test_log": log }))
    }

    #[test]
    fn names_device_from_model_and_user_capacity() {
        let report = report(json!({
            "model_name": "SAMSUNG MZYLF128HCHP-000L2",
            "user_capacity": { "blocks": 250069680, "bytes": 128035676160u64 }
        }));
        assert_eq!(
            human_readable_name(&report),
            "SAMSUNG MZYLF128HCHP-000L2 - 119.2GB"
        );
    }

    #[test]
    fn names_nvme_device_from_total_capacity() {
        let report = report(json!({
            "model_name": "WDC WDS500G2B0C",
            "nvme_total_capacity": 500107862016u64
        }));
        assert_eq!(human_readable_name(&report), "WDC WDS500G2B0C - 465.8GB");
    }

    #[test]
    fn zero_user_capacity_falls_through_to_nvme_capacity() {
        let report = report(json!({
            "model_name": "X",
            "user_capacity": { "bytes": 0 },
            "nvme_total_capacity": 1073741824u64
        }));
        assert_eq!(human_readable_name(&report), "X - 1.0GB");
    }

    #[test]
    fn missing_model_and_capacity_use_sentinels() {
        assert_eq!(human_readable_name(&report(json!({}))), "UNKNOWN - -0.0GB");
    }

    #[test]
    fn device_identifier_defaults_to_unknown() {
        assert_eq!(
            device_identifier(&report(json!({ "device": { "name": "/dev/nvme0" } }))),
            "/dev/nvme0"
        );
        assert_eq!(device_identifier(&report(json!({ "device": {} }))), "UNKNOWN");
    }

    #[test]
    fn status_passed_reads_smart_status() {
        assert!(status_passed(&report(json!({ "smart_status": { "passed": true } }))));
        assert!(!status_passed(&report(json!({ "smart_status": { "passed": false } }))));
    }

    #[test]
    fn status_fails_when_status_missing() {
        assert!(!status_passed(&report(json!({ "smart_status": {} }))));
    }

    #[test]
    fn status_fails_when_status_block_missing() {
        assert!(!status_passed(&report(json!({ "device": { "name": "/dev/sda" } }))));
        assert!(!status_passed(&report(json!({ "smart_status": null }))));
        assert!(!status_passed(&report(json!([]))));
    }

    #[test]
    fn ata_self_test_progress_from_status_string() {
        let running = ata_self_test(json!({
            "value": 249,
            "string": "in progress, 90% remaining",
            "remaining_percent": 90
        }));
        assert!(self_test_in_progress(&running));

        let finished = ata_self_test(json!({
            "value": 0,
            "string": "completed without error",
            "passed": true
        }));
        assert!(!self_test_in_progress(&finished));
        assert!(!self_test_in_progress(&report(json!({ "ata_smart_data": {} }))));
    }

    #[test]
    fn nvme_self_test_progress_from_current_operation() {
        let running = nvme_self_test_log(json!({
            "current_self_test_operation": { "value": 1, "string": "Short self-test in progress" }
        }));
        assert!(self_test_in_progress(&running));

        let idle = nvme_self_test_log(json!({
            "current_self_test_operation": { "value": 0, "string": "No self-test in progress" }
        }));
        assert!(!self_test_in_progress(&idle));
        assert!(!self_test_in_progress(&report(json!({}))));
    }

    #[test]
    fn ata_self_test_passed_follows_nested_flag() {
        assert!(self_test_passed(&ata_self_test(json!({ "passed": true }))));
        assert!(!self_test_passed(&ata_self_test(json!({ "passed": false }))));
        assert!(!self_test_passed(&ata_self_test(json!({ "string": "aborted" }))));
    }

    #[test]
    fn nvme_self_test_result_zero_means_passed() {
        let passed = nvme_self_test_log(json!({
            "table": [
                { "self_test_code": { "value": 1 }, "self_test_result": { "value": 0 } },
                { "self_test_code": { "value": 1 }, "self_test_result": { "value": 7 } }
            ]
        }));
        assert!(self_test_passed(&passed));

        let failed = nvme_self_test_log(json!({
            "table": [{ "self_test_result": { "value": 1 } }]
        }));
        assert!(!self_test_passed(&failed));
    }

    #[test]
    fn nvme_self_test_without_entries_fails() {
        assert!(!self_test_passed(&nvme_self_test_log(json!({ "table": [] }))));
        assert!(!self_test_passed(&nvme_self_test_log(json!({ "table": [{}] }))));
        assert!(!self_test_passed(&nvme_self_test_log(json!({}))));
        assert!(!self_test_passed(&report(json!({}))));
    }

    #[test]
    fn poll_interval_from_short_polling_minutes() {
        let report = report(json!({
            "ata_smart_data": { "self_test": { "polling_minutes": { "short": 2, "extended": 95 } } }
        }));
        assert_eq!(poll_interval_seconds(&report), 120);
        assert_eq!(poll_interval_seconds_for(&report, SelfTestKind::Long), 95 * 60);
        assert_eq!(
            poll_interval(&report, SelfTestKind::Short),
            Duration::from_secs(120)
        );
    }

    #[test]
    fn poll_interval_rounds_fractional_minutes_down() {
        let report = report(json!({
            "ata_smart_data": { "self_test": { "polling_minutes": { "short": 1.255 } } }
        }));
        assert_eq!(poll_interval_seconds(&report), 75);
    }

    #[test]
    fn poll_interval_defaults_when_missing() {
        assert_eq!(poll_interval_seconds(&report(json!({}))), 60);
        assert_eq!(
            poll_interval_seconds(&report(json!({ "ata_smart_data": { "self_test": {} } }))),
            60
        );
        assert_eq!(
            poll_interval_seconds(&report(json!({
                "ata_smart_data": { "self_test": { "polling_minutes": { "short": -3 } } }
            }))),
            60
        );
    }

    #[test]
    fn poll_interval_below_one_second_uses_default() {
        for minutes in [json!(0), json!(0.01)] {
            let report = report(json!({
                "ata_smart_data": { "self_test": { "polling_minutes": { "short": minutes } } }
            }));
            assert_eq!(poll_interval_seconds(&report), 60);
        }
    }

    #[test]
    fn ata_metric_reads_attribute_raw_value() {
        let report = report(json!({
            "ata_smart_data": {},
            "ata_smart_attributes": { "table": [
                { "id": 5, "name": "Reallocated_Sector_Ct", "raw": { "value": 12, "string": "12" } },
                { "id": 194, "name": "Temperature_Celsius", "raw": { "value": 36, "string": "36" } }
            ] }
        }));
        assert_eq!(metric_value(&report, "Reallocated_Sector_Ct"), Some(12));
        assert_eq!(metric_value(&report, "Temperature_Celsius"), Some(36));
        assert_eq!(metric_value(&report, "Power_On_Hours"), None);
    }

    #[test]
    fn nvme_metric_reads_health_log() {
        let report = report(json!({
            "nvme_smart_health_information_log": { "media_errors": 3, "percentage_used": 4 }
        }));
        assert_eq!(metric_value(&report, "media_errors"), Some(3));
        assert_eq!(metric_value(&report, "unsafe_shutdowns"), None);
    }

    #[test]
    fn breaches_listed_in_metric_order() {
        let report = report(json!({
            "nvme_smart_health_information_log": {
                "media_errors": 3,
                "percentage_used": 90,
                "temperature": 40
            }
        }));
        let limits = BTreeMap::from([
            ("temperature".to_string(), 60),
            ("percentage_used".to_string(), 80),
            ("media_errors".to_string(), 0),
            ("num_err_log_entries".to_string(), 0),
        ]);

        let breaches = limit_breaches(&report, &limits);
        assert_eq!(
            breaches,
            vec![
                LimitBreach { metric: "media_errors".to_string(), value: 3, limit: 0 },
                LimitBreach { metric: "percentage_used".to_string(), value: 90, limit: 80 },
            ]
        );
    }
}
