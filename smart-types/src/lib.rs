// SPDX-License-Identifier: GPL-3.0-only

//! Result models for smart-monitor
//!
//! These value types are produced by the check orchestrator and consumed by
//! the CLI for table/JSON output and notifications:
//!
//! - `TestType` / `SelfTestKind` → which check produced a result
//! - `DeviceTestResult` → outcome of one check on one device
//! - `TestResults` → ordered outcomes of a run over several devices

pub mod kind;
pub mod result;
pub mod table;

pub use kind::{SelfTestKind, TestType};
pub use result::{DeviceTestResult, TestResults};
pub use table::render_table;
