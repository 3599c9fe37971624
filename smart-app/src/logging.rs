// SPDX-License-Identifier: GPL-3.0-only

use std::env;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::Context;
use chrono::Local;
use clap::ValueEnum;
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::{self, FormatEvent, FormatFields};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_LOG_PREFIX: &str = "smart-monitor.log";
const LOG_FILE_ENV: &str = "SMART_MONITOR_LOG_FILE";
const LOG_DIR_ENV: &str = "SMART_MONITOR_LOG_DIR";
const LOG_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// How the process logs. Built by the binary and handed to [`init`].
#[derive(Debug, Clone)]
pub struct LogSettings {
    pub level: LogLevel,
    /// Log file path; falls back to the environment and then the XDG state dir
    pub log_file: Option<PathBuf>,
    pub log_to_disk: bool,
    /// Colour console output
    pub ansi: bool,
}

/// Keeps the background file writer alive. Dropping it flushes the log.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// `[2024-05-01 12:00:00] WARN     message` lines, the whole line coloured
/// by level when the writer supports ANSI.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let level = *event.metadata().level();
        let color = writer
            .has_ansi_escapes()
            .then(|| level_color(level))
            .flatten();

        if let Some(color) = color {
            writer.write_str(color)?;
        }
        write!(
            writer,
            "[{}] {:<8} ",
            Local::now().format(DATE_FORMAT),
            level.as_str()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        if color.is_some() {
            writer.write_str(RESET)?;
        }
        writeln!(writer)
    }
}

fn level_color(level: Level) -> Option<&'static str> {
    match level {
        Level::ERROR => Some(RED),
        Level::WARN => Some(YELLOW),
        _ => None,
    }
}

/// Install the global subscriber: console on stdout plus a daily rolling
/// file. If the log file cannot be set up, logging continues on the console.
pub fn init(settings: &LogSettings) -> anyhow::Result<LogGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.as_directive()));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(settings.ansi)
        .event_format(LineFormat);

    let file = if settings.log_to_disk {
        match LogLocation::resolve(settings.log_file.as_deref()).open() {
            Ok(file) => Some(file),
            Err(e) => {
                eprintln!("smart-monitor: failed to initialize file logging: {e:#}");
                None
            }
        }
    } else {
        None
    };

    match file {
        Some((writer, guard)) => {
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .event_format(LineFormat);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(stdout_layer)
                .with(file_layer)
                .try_init()?;

            Ok(LogGuard { _file: Some(guard) })
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(stdout_layer)
                .try_init()?;

            Ok(LogGuard { _file: None })
        }
    }
}

/// Where the rolling appender writes: `<dir>/<prefix>.<date>`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LogLocation {
    dir: PathBuf,
    prefix: OsString,
}

impl LogLocation {
    /// The explicit path, then `SMART_MONITOR_LOG_FILE`, then
    /// `SMART_MONITOR_LOG_DIR`, then the XDG state directory.
    fn resolve(explicit: Option<&Path>) -> Self {
        let file = explicit
            .map(Path::to_path_buf)
            .or_else(|| env::var_os(LOG_FILE_ENV).map(PathBuf::from));
        if let Some(file) = file {
            return Self::for_file(&file);
        }

        Self {
            dir: env::var_os(LOG_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(state_dir),
            prefix: OsString::from(DEFAULT_LOG_PREFIX),
        }
    }

    fn for_file(file: &Path) -> Self {
        let dir = match file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let prefix = file
            .file_name()
            .map_or_else(|| OsString::from(DEFAULT_LOG_PREFIX), OsString::from);
        Self { dir, prefix }
    }

    /// Create the directory, prune stale rolled files and start the
    /// background writer.
    fn open(&self) -> anyhow::Result<(NonBlocking, WorkerGuard)> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("create log directory {}", self.dir.display()))?;
        prune_rolled_logs(&self.dir, &self.prefix, LOG_RETENTION);

        let appender = tracing_appender::rolling::daily(&self.dir, &self.prefix);
        Ok(tracing_appender::non_blocking(appender))
    }
}

fn state_dir() -> PathBuf {
    env::var_os("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".local/state")))
        .unwrap_or_else(env::temp_dir)
        .join("smart-monitor")
        .join("logs")
}

/// Delete files in `dir` named `<prefix>*` that were last modified more
/// than `max_age` ago. Returns the number removed.
fn prune_rolled_logs(dir: &Path, prefix: &OsStr, max_age: Duration) -> usize {
    let Some(cutoff) = SystemTime::now().checked_sub(max_age) else {
        return 0;
    };
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    let prefix = prefix.to_string_lossy();

    entries
        .flatten()
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(&*prefix))
        .filter(|entry| {
            entry.metadata().is_ok_and(|metadata| {
                metadata.is_file() && metadata.modified().is_ok_and(|modified| modified < cutoff)
            })
        })
        .filter(|entry| fs::remove_file(entry.path()).is_ok())
        .count()
}
