// SPDX-License-Identifier: GPL-3.0-only

//! smartctl operations for disk health checks
//!
//! This crate provides:
//! - `Smartctl`, a thin wrapper around the `smartctl` command-line tool
//! - `DiagnosticSource`, the trait check orchestration is written against
//! - `DiagnosticReport`, a parsed `smartctl --json` document tagged with
//!   its ATA/NVMe dialect
//! - `interpret`, pure functions deriving names, verdicts and poll
//!   intervals from a report
//!
//! Invoking smartctl generally requires root privileges.

pub mod error;
pub mod interpret;
pub mod report;
pub mod smartctl;
pub mod source;

pub use error::{DiagnosticError, Result};
pub use interpret::LimitBreach;
pub use report::{DiagnosticReport, ReportDialect};
pub use smartctl::Smartctl;
pub use source::DiagnosticSource;
