// SPDX-License-Identifier: GPL-3.0-only

use smart_types::SelfTestKind;

use crate::{DiagnosticReport, Result};

/// Where diagnostic reports come from.
///
/// `Smartctl` is the production implementation; check orchestration only
/// depends on this trait so it can run against scripted sources.
pub trait DiagnosticSource {
    /// Full-detail report for one device (`smartctl --xall --json`).
    fn report(&self, device: &str) -> Result<DiagnosticReport>;

    /// Self-test and error logs as human-readable text, unmodified.
    fn error_log(&self, device: &str) -> Result<String>;

    /// Ask the device for its health verdict. The output is discarded; the
    /// call only refreshes state visible in the next `report`.
    fn refresh_health(&self, device: &str) -> Result<()>;

    /// Start a self-test and return without waiting for it.
    fn start_self_test(&self, device: &str, kind: SelfTestKind) -> Result<()>;

    /// Identifiers of every device smartctl can find, in scan order.
    fn scan(&self) -> Result<Vec<String>>;
}
