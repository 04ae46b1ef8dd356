//! File Organiser - sort a directory tree into category folders
//!
//! This library provides:
//! - A priority-ordered chain of classification plugins (extension table,
//!   magic numbers, MIME type, filename rules)
//! - A collision-safe mover with atomic rename and cross-filesystem fallback
//! - An organiser that drives discovery, categorisation and moves with
//!   per-file error isolation and cooperative cancellation

pub mod categoriser;
pub mod cli;
pub mod config;
pub mod error;
pub mod hash;
pub mod model;
pub mod mover;
pub mod organiser;
pub mod os;
pub mod plugin;
pub mod report;
pub mod validate;

pub use categoriser::{Categoriser, CategoryInfo, CategoryMeta, CategoryRegistry};
pub use cli::Cli;
pub use config::{Config, ConfigError};
pub use error::{Error, MoveError, Result};
pub use model::{FileDescriptor, MoveOutcome, MoveStatus, RunResult, RunStatistics};
pub use mover::{CollisionIndex, MoveOptions, MoveRequest, Mover};
pub use organiser::{CancelToken, Organiser, build_categoriser};
pub use plugin::{ClassifierPlugin, FileFilter, PluginRegistry, PostProcessor};
pub use report::{LogReporter, Reporter, SilentReporter};
