// SPDX-License-Identifier: GPL-3.0-only

//! smart-monitor: disk health checks and self-tests via smartctl

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use smart_monitor::logging::{self, LogLevel, LogSettings};
use smart_monitor::{Checker, Notifier, Settings, Severity, config, summary};
use smart_sys::Smartctl;
use smart_types::TestResults;
use tracing::error;

/// Check disk health with smartctl
#[derive(Parser)]
#[command(name = "smart-monitor", version)]
#[command(about = "Check disk health and run self-tests with smartctl", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (default: $XDG_CONFIG_HOME/smart-monitor/settings.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log file prefix; a date suffix is added daily
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Only log to the console
    #[arg(long, global = true)]
    no_log_file: bool,

    /// Send the summary through the alert command when a check fails
    #[arg(long, global = true)]
    notify: bool,

    /// Print results as JSON instead of a table
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the overall health verdict
    Status {
        /// Device to check; all scanned devices when omitted
        device: Option<String>,
    },
    /// Run a short self-test and wait for it to finish
    Short {
        /// Device to test; all scanned devices when omitted
        device: Option<String>,
    },
    /// Run an extended self-test and wait for it to finish
    Long {
        /// Device to test; all scanned devices when omitted
        device: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_settings = LogSettings {
        level: cli.log_level,
        log_file: cli.log_file.clone(),
        log_to_disk: !cli.no_log_file,
        ansi: std::io::stdout().is_terminal(),
    };
    let _log_guard = match logging::init(&log_settings) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("smart-monitor: failed to initialize logging: {e:#}");
            None
        }
    };

    let settings = match config::load(&config::resolve_settings_path(cli.config.as_deref())) {
        Ok(settings) => settings,
        Err(e) => {
            let e = anyhow::Error::new(e);
            error!("{e:#}");
            // Still alert, through the default notify command.
            if let Err(e) = report(&cli, &Settings::default(), Err(&e)) {
                error!("{e:#}");
            }
            return ExitCode::from(2);
        }
    };

    let outcome = run(&cli, &settings);
    let code = match &outcome {
        Ok(results) if results.passed() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(2)
        }
    };

    if let Err(e) = report(&cli, &settings, outcome.as_ref()) {
        error!("{e:#}");
        return ExitCode::from(2);
    }

    code
}

fn run(cli: &Cli, settings: &Settings) -> Result<TestResults> {
    let smartctl = Smartctl::new()?;
    let checker = Checker::new(&smartctl, settings);

    let results: TestResults = match &cli.command {
        Commands::Status { device: Some(device) } => checker.status(device)?.into(),
        Commands::Status { device: None } => checker.status_all()?,
        Commands::Short { device: Some(device) } => checker.short(device)?.into(),
        Commands::Short { device: None } => checker.short_all()?,
        Commands::Long { device: Some(device) } => checker.long(device)?.into(),
        Commands::Long { device: None } => checker.long_all()?,
    };

    summary::log_summary(&results);
    Ok(results)
}

fn report(
    cli: &Cli,
    settings: &Settings,
    outcome: Result<&TestResults, &anyhow::Error>,
) -> Result<()> {
    let (text, severity) = summary::notification(outcome);
    let notifier = if cli.notify {
        Notifier::new(settings.notify_command())
    } else {
        Notifier::console_only()
    };

    match outcome {
        Ok(results) if cli.json => {
            let json = serde_json::to_string_pretty(results).context("serialize results")?;
            println!("{json}");
            if severity == Severity::Error {
                notifier.alert(&text);
            }
        }
        Ok(_) => notifier.notify(&text, severity),
        // Already logged to the console
        Err(_) => notifier.alert(&text),
    }

    Ok(())
}
