//! File Organiser - sort a directory into category folders
//!
//! Discovers files under a directory, classifies each through the plugin
//! chain and moves it into a category subfolder.

use anyhow::{Context, Result, bail};
use clap::Parser;
use file_organiser::{Cli, Config, Error, LogReporter, Organiser, RunResult, os};
use std::path::Path;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Exit status after Ctrl+C, matching shell convention (128 + SIGINT)
const INTERRUPTED_EXIT_CODE: u8 = 130;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let _guard = setup_logging(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "File Organiser starting");

    let config = load_config(&cli)?;
    if cli.verbose {
        info!(?config, "Configuration loaded");
    }

    let mut organiser = Organiser::from_config(&config)?;
    if let Err(e) = os::install_interrupt_handler(organiser.cancel_token()) {
        warn!(error = %e, "Ctrl+C handling unavailable");
    }

    let mut reporter = LogReporter::new();
    let outcome = organiser.run(&mut reporter);
    match &outcome {
        Ok(result) => print_result(&cli, result)?,
        Err(Error::Interrupted(result)) => {
            print_result(&cli, result)?;
            eprintln!("Interrupted - {} files were processed before stopping", result.processed);
        }
        Err(e) => {
            error!(error = %e, "Organisation failed");
            eprintln!("Error: {}", e);
        }
    }

    // Returned rather than exiting so the log file guard flushes on drop
    Ok(ExitCode::from(exit_status(&outcome)))
}

/// Process exit status for a finished, failed or interrupted run
fn exit_status(outcome: &std::result::Result<RunResult, Error>) -> u8 {
    match outcome {
        Ok(result) if result.success() => 0,
        Err(Error::Interrupted(_)) => INTERRUPTED_EXIT_CODE,
        _ => 1,
    }
}

/// Config file values (if any) overlaid with CLI flags
fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => {
            info!(config_file = %path.display(), "Loading configuration file");
            let file_config = Config::load_from_file(path)?;
            cli.merge_with_config(file_config)
        }
        None => {
            if cli.directory.is_none() {
                bail!("No directory given. Pass a directory or a config file with --config");
            }
            cli.to_config()
        }
    };

    if config.max_name_attempts == 0 {
        bail!("max_name_attempts must be at least 1");
    }

    Ok(config)
}

/// Print the run outcome to stdout, as JSON with `--json`
fn print_result(cli: &Cli, result: &RunResult) -> Result<()> {
    if cli.json {
        let json = serde_json::to_string_pretty(result).context("Failed to encode result")?;
        println!("{}", json);
        return Ok(());
    }

    let separator = "─".repeat(50);
    println!("{}", separator);
    if result.dry_run {
        println!("  Dry run complete (no files were moved)");
    } else {
        println!("  Organisation complete");
    }
    println!("{}", separator);
    println!("  {:<12}{}", "Processed", result.processed);
    println!("  {:<12}{}", if result.dry_run { "Would move" } else { "Moved" }, result.moved);
    println!("  {:<12}{}", "Skipped", result.skipped);
    println!("  {:<12}{}", "Failed", result.failed);
    println!("  {:<12}{}", "Unknown", result.unknown);
    println!("  {:<12}{:.2}s", "Duration", result.duration.as_secs_f64());

    if !result.categories.is_empty() {
        let categories: Vec<_> = result.categories.iter().map(String::as_str).collect();
        println!("  {:<12}{}", "Categories", categories.join(", "));
    }

    if !result.errors.is_empty() {
        println!("{}", separator);
        println!("  Failed files:");
        for (path, cause) in &result.errors {
            println!("    {}: {}", path.display(), cause);
        }
    }

    Ok(())
}

fn setup_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let subscriber = tracing_subscriber::registry().with(env_filter);

    let Some(log_path) = cli.log_file.as_deref() else {
        if cli.json_log {
            subscriber
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        } else {
            subscriber
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
        return Ok(None);
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(open_log_file(log_path)?);

    if cli.json_log {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(Some(guard))
}

fn open_log_file(log_path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = log_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))
}
