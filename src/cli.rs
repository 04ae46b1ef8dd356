//! CLI argument parsing with clap

use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

/// File Organiser - sort a directory into category folders
///
/// Files are classified by extension, file header and MIME type, then moved
/// into `<directory>/<category>/` with collision-safe names.
#[derive(Parser, Debug)]
#[command(name = "file-organiser")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory to organise
    pub directory: Option<PathBuf>,

    /// Path to configuration file (TOML format)
    ///
    /// When specified, settings from the config file are used as defaults.
    /// CLI arguments will override config file settings.
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Dry run mode - show what would be done without doing it
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Include hidden files and directories
    #[arg(long)]
    pub include_hidden: bool,

    /// Glob pattern of paths to leave alone (repeatable)
    #[arg(short = 'x', long = "exclude", value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Skip content-hash verification after each move
    #[arg(long)]
    pub no_verify: bool,

    /// Move with a plain copy + delete instead of atomic rename
    #[arg(long)]
    pub no_atomic: bool,

    /// Do not carry permissions and timestamps over when copying
    #[arg(long)]
    pub no_preserve_metadata: bool,

    /// Category for files no classifier recognises
    #[arg(long, value_name = "CATEGORY")]
    pub fallback: Option<String>,

    /// Allow organising system or home directories
    #[arg(long)]
    pub no_validate: bool,

    /// Print the run result as JSON
    #[arg(long)]
    pub json: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Output log format as JSON
    #[arg(long)]
    pub json_log: bool,

    /// Also write logs to this file
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Merge CLI arguments with config from file
    /// CLI arguments take precedence over config file settings
    pub fn merge_with_config(&self, mut config: Config) -> Config {
        if let Some(ref directory) = self.directory {
            config.directory = directory.clone();
        }
        if self.dry_run {
            config.dry_run = true;
        }
        if self.include_hidden {
            config.include_hidden = true;
        }
        config.exclude_patterns.extend(self.exclude.iter().cloned());
        if self.no_verify {
            config.verify = false;
        }
        if self.no_atomic {
            config.atomic = false;
        }
        if self.no_preserve_metadata {
            config.preserve_metadata = false;
        }
        if let Some(ref fallback) = self.fallback {
            config.fallback_category = fallback.clone();
        }
        if self.no_validate {
            config.validate_paths = false;
        }

        config
    }

    /// Convert CLI arguments to Config (when no config file is used)
    pub fn to_config(&self) -> Config {
        self.merge_with_config(Config::default())
    }
}
