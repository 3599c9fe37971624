// SPDX-License-Identifier: GPL-3.0-only

//! smartctl CLI operations
//!
//! smartctl's exit status is a bitmask. Bit 0 (command line did not parse)
//! and bit 1 (device could not be opened) mean the invocation itself failed.
//! The remaining bits describe the disk's condition and come with a usable
//! report, so they are not treated as errors here.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use serde_json::Value;
use smart_types::SelfTestKind;
use tracing::{debug, info};
use which::which;

use crate::error::{DiagnosticError, Result};
use crate::{DiagnosticReport, DiagnosticSource};

pub const SMARTCTL_BINARY: &str = "smartctl";

const INVOCATION_FAILURE_BITS: i32 = 0b11;

/// smartctl CLI wrapper
#[derive(Debug, Clone)]
pub struct Smartctl {
    binary_path: PathBuf,
}

impl Smartctl {
    /// Locate smartctl in PATH.
    pub fn new() -> Result<Self> {
        let binary_path = which(SMARTCTL_BINARY).map_err(DiagnosticError::UtilityNotFound)?;
        info!("Found smartctl binary at {:?}", binary_path);
        Ok(Self { binary_path })
    }

    /// Use a specific smartctl binary.
    pub fn with_binary(binary_path: impl Into<PathBuf>) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let command = render(SMARTCTL_BINARY, args);
        debug!("Running {command}");

        let output = Command::new(&self.binary_path)
            .args(args)
            .output()
            .map_err(|source| DiagnosticError::Invocation {
                command: command.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let code = output.status.code();
        if is_invocation_failure(code) {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DiagnosticError::CommandFailed {
                command,
                code: code.unwrap_or(-1),
                message: failure_message(&stdout, &stderr),
            });
        }

        if let Some(code) = code
            && code != 0
        {
            debug!("{command} reported device condition bits {code:#010b}");
        }

        Ok(stdout)
    }
}

impl DiagnosticSource for Smartctl {
    fn report(&self, device: &str) -> Result<DiagnosticReport> {
        let args = ["--xall", "--json", device];
        let stdout = self.run(&args)?;
        DiagnosticReport::from_json(&stdout).map_err(|source| DiagnosticError::MalformedReport {
            command: render(SMARTCTL_BINARY, &args),
            source,
        })
    }

    fn error_log(&self, device: &str) -> Result<String> {
        self.run(&["--log=selftest", "--log=error", "--log=xerror", device])
    }

    fn refresh_health(&self, device: &str) -> Result<()> {
        self.run(&["--health", "--json", device]).map(drop)
    }

    fn start_self_test(&self, device: &str, kind: SelfTestKind) -> Result<()> {
        let test = format!("--test={}", kind.as_smartctl_str());
        self.run(&[test.as_str(), "--json", device]).map(drop)
    }

    fn scan(&self) -> Result<Vec<String>> {
        let stdout = self
            .run(&["--scan", "--json"])
            .map_err(|e| DiagnosticError::Enumeration(e.to_string()))?;
        let devices = parse_scan(&stdout)?;
        debug!("Found {} devices", devices.len());
        Ok(devices)
    }
}

#[derive(Debug, Deserialize)]
struct ScanOutput {
    devices: Vec<ScannedDevice>,
}

#[derive(Debug, Deserialize)]
struct ScannedDevice {
    name: Option<String>,
    info_name: Option<String>,
}

/// Device paths from `smartctl --scan --json` output, in scan order.
fn parse_scan(output: &str) -> Result<Vec<String>> {
    let scan: ScanOutput = serde_json::from_str(output)
        .map_err(|e| DiagnosticError::Enumeration(format!("unreadable scan output: {e}")))?;

    scan.devices
        .into_iter()
        .enumerate()
        .map(|(index, device)| {
            device.name.or(device.info_name).ok_or_else(|| {
                DiagnosticError::Enumeration(format!("scan entry {index} has no device name"))
            })
        })
        .collect()
}

fn is_invocation_failure(code: Option<i32>) -> bool {
    match code {
        Some(code) => code & INVOCATION_FAILURE_BITS != 0,
        // Terminated by a signal
        None => true,
    }
}

/// Best available explanation of a failed invocation. With `--json`
/// smartctl reports problems in `smartctl.messages` on stdout rather than
/// on stderr.
fn failure_message(stdout: &str, stderr: &str) -> String {
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }

    let messages: Vec<String> = serde_json::from_str::<Value>(stdout)
        .ok()
        .and_then(|document| document.pointer("/smartctl/messages").cloned())
        .and_then(|messages| messages.as_array().cloned())
        .unwrap_or_default()
        .iter()
        .filter_map(|message| message.get("string")?.as_str().map(ToString::to_string))
        .collect();

    if messages.is_empty() {
        stdout.trim().to_string()
    } else {
        messages.join("; ")
    }
}

pub(crate) fn render(command: &str, args: &[&str]) -> String {
    if args.is_empty() {
        command.to_string()
    } else {
        format!("{} {}", command, args.join(" "))
    }
}
