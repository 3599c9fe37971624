// SPDX-License-Identifier: GPL-3.0-only

//! Disk health checks driven by smartctl
//!
//! - `checks`: status and self-test orchestration over one or all devices
//! - `config`: settings file loading
//! - `logging`: console and rolling-file log setup
//! - `notify`: console output and the chat side channel for failures
//! - `summary`: human-readable run summaries

pub mod checks;
pub mod config;
pub mod logging;
pub mod notify;
pub mod summary;

pub use checks::{CheckError, Checker};
pub use config::{ConfigError, Settings};
pub use notify::{Notifier, Severity};
