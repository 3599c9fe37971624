// SPDX-License-Identifier: GPL-3.0-only

use thiserror::Error;

/// Error types for smartctl operations
#[derive(Error, Debug)]
pub enum DiagnosticError {
    #[error("smartctl not found: {0}")]
    UtilityNotFound(#[source] which::Error),

    #[error("failed to run {command}: {source}")]
    Invocation {
        command: String,
        source: std::io::Error,
    },

    #[error("{command} exited with status {code}: {message}")]
    CommandFailed {
        command: String,
        code: i32,
        message: String,
    },

    #[error("{command} returned a malformed report: {source}")]
    MalformedReport {
        command: String,
        source: serde_json::Error,
    },

    #[error("device enumeration failed: {0}")]
    Enumeration(String),
}

/// Result type alias for smartctl operations
pub type Result<T> = std::result::Result<T, DiagnosticError>;
