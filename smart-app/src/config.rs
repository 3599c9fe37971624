// SPDX-License-Identifier: GPL-3.0-only

//! Settings file
//!
//! TOML by default; a `.json` file is read as JSON. Both spellings of the
//! keys are accepted (`exclude_paths` and `EXCLUDE_PATHS`).
//!
//! ```toml
//! exclude_paths = ["/dev/sdz", "/dev/nvme1*"]
//! max_polls = 30
//!
//! [custom_alert_limits]
//! Reallocated_Sector_Ct = 0
//! media_errors = 0
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_NOTIFY_COMMAND: &str = "notify-discord";

const APP_DIR: &str = "smart-monitor";
const SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid settings {path:?}: {reason}")]
    Parse { path: PathBuf, reason: String },
    #[error("invalid exclude pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    Toml,
    Json,
}

impl SettingsFormat {
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SettingsFile {
    #[serde(alias = "CUSTOM_ALERT_LIMITS")]
    custom_alert_limits: BTreeMap<String, i64>,
    #[serde(alias = "EXCLUDE_PATHS")]
    exclude_paths: Vec<String>,
    #[serde(alias = "MAX_POLLS")]
    max_polls: Option<u32>,
    #[serde(alias = "NOTIFY_COMMAND")]
    notify_command: Option<String>,
}

/// Validated settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    /// Metric name → highest acceptable value
    pub custom_alert_limits: BTreeMap<String, i64>,

    /// Device paths matching any of these are skipped by all-devices checks
    pub exclude_paths: Vec<Pattern>,

    /// Give up on a self-test after this many polls. Unlimited when unset.
    pub max_polls: Option<u32>,

    notify_command: Option<String>,
}

impl Settings {
    pub fn is_excluded(&self, device: &str) -> bool {
        self.exclude_paths
            .iter()
            .any(|pattern| pattern.matches(device))
    }

    /// Executable used to send failure alerts
    pub fn notify_command(&self) -> &str {
        self.notify_command
            .as_deref()
            .unwrap_or(DEFAULT_NOTIFY_COMMAND)
    }
}

impl TryFrom<SettingsFile> for Settings {
    type Error = ConfigError;

    fn try_from(file: SettingsFile) -> Result<Self, Self::Error> {
        let exclude_paths = file
            .exclude_paths
            .into_iter()
            .map(|pattern| {
                Pattern::new(&pattern).map_err(|source| ConfigError::Pattern { pattern, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            custom_alert_limits: file.custom_alert_limits,
            exclude_paths,
            max_polls: file.max_polls,
            notify_command: file.notify_command,
        })
    }
}

/// Settings location: the explicit path, else `SMART_MONITOR_CONFIG`, else
/// `settings.toml` in the user's config directory.
pub fn resolve_settings_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    if let Some(path) = std::env::var_os("SMART_MONITOR_CONFIG") {
        return PathBuf::from(path);
    }

    default_config_dir().join(SETTINGS_FILE)
}

fn default_config_dir() -> PathBuf {
    if let Some(xdg_config) = std::env::var_os("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg_config).join(APP_DIR);
    }

    if let Some(home) = std::env::var_os("HOME") {
        return PathBuf::from(home).join(".config").join(APP_DIR);
    }

    PathBuf::from("/etc").join(APP_DIR)
}

/// Load settings from `path`. A missing file yields the defaults.
pub fn load(path: &Path) -> Result<Settings, ConfigError> {
    if !path.is_file() {
        warn!("{} not found, using defaults", path.display());
        return Ok(Settings::default());
    }

    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let settings = parse(&raw, SettingsFormat::for_path(path), path)?;
    debug!(
        "Loaded settings from {}: {} alert limits, {} exclude patterns",
        path.display(),
        settings.custom_alert_limits.len(),
        settings.exclude_paths.len()
    );
    Ok(settings)
}

/// Parse settings text. `origin` only labels errors.
pub fn parse(raw: &str, format: SettingsFormat, origin: &Path) -> Result<Settings, ConfigError> {
    let parse_error = |reason: String| ConfigError::Parse {
        path: origin.to_path_buf(),
        reason,
    };

    let file: SettingsFile = match format {
        SettingsFormat::Toml => toml::from_str(raw).map_err(|e| parse_error(e.to_string()))?,
        SettingsFormat::Json => serde_json::from_str(raw).map_err(|e| parse_error(e.to_string()))?,
    };

    Settings::try_from(file)
}
