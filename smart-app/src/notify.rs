// SPDX-License-Identifier: GPL-3.0-only

//! Console output plus a chat side channel for failures
//!
//! The side channel is an external command (by default `notify-discord`)
//! called as `<command> <message> --level error`.

use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, warn};
use which::which;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

#[derive(Debug, Clone, Default)]
pub struct Notifier {
    command: Option<PathBuf>,
}

impl Notifier {
    /// Notifier alerting through `command`. If the command cannot be found,
    /// messages are only printed.
    pub fn new(command: &str) -> Self {
        match which(command) {
            Ok(path) => Self {
                command: Some(path),
            },
            Err(e) => {
                warn!("{command} unavailable, alerts will only be printed: {e}");
                Self::console_only()
            }
        }
    }

    pub fn console_only() -> Self {
        Self { command: None }
    }

    pub fn has_side_channel(&self) -> bool {
        self.command.is_some()
    }

    /// Print `message`; error messages are also sent through the side channel.
    pub fn notify(&self, message: &str, severity: Severity) {
        println!("{message}");
        if severity == Severity::Error {
            self.alert(message);
        }
    }

    /// Send `message` through the side channel only.
    pub fn alert(&self, message: &str) {
        let Some(command) = &self.command else {
            return;
        };

        match Command::new(command)
            .args(side_channel_args(message))
            .status()
        {
            Ok(status) if status.success() => debug!("Alert sent via {}", command.display()),
            Ok(status) => warn!("{} exited with {status}", command.display()),
            Err(e) => warn!("Failed to run {}: {e}", command.display()),
        }
    }
}

fn side_channel_args(message: &str) -> [&str; 3] {
    [message, "--level", "error"]
}
