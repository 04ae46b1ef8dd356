//! Core data model shared by the categoriser, mover and organiser
//!
//! - [`FileDescriptor`]: immutable snapshot of a file taken at discovery time
//! - [`MoveOutcome`]: result of one move attempt
//! - [`RunStatistics`]: accumulator owned by the organiser for one run
//! - [`RunResult`]: immutable snapshot reported when a run ends

use crate::error::MoveError;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Snapshot of one file captured once at discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDescriptor {
    /// Absolute path of the file
    pub path: PathBuf,
    /// Base name including extension
    pub name: String,
    /// Lowercase extension with its leading dot, empty when there is none
    pub extension: String,
    /// Size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: DateTime<Utc>,
}

impl FileDescriptor {
    /// Stat `path` and capture its descriptor
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;
        let modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| DateTime::<Utc>::UNIX_EPOCH);
        Ok(Self::new(path.to_path_buf(), metadata.len(), modified))
    }

    /// Build a descriptor without touching the filesystem
    pub fn new(path: PathBuf, size: u64, modified: DateTime<Utc>) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default();
        Self {
            path,
            name,
            extension,
            size,
            modified,
        }
    }
}

/// Status of a move attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveStatus {
    /// The file was relocated
    Success,
    /// The move failed; the outcome carries the cause
    Failed,
    /// The file was left in place (already organised)
    Skipped,
    /// Dry run - the destination was computed but nothing was touched
    DryRun,
}

/// Result of one move attempt
///
/// Constructed through the status-specific constructors so that a destination
/// is present exactly when the status has one and a cause exactly on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveOutcome {
    status: MoveStatus,
    source: PathBuf,
    destination: Option<PathBuf>,
    category: Option<String>,
    error: Option<MoveError>,
}

impl MoveOutcome {
    pub fn success(source: PathBuf, destination: PathBuf, category: Option<String>) -> Self {
        Self {
            status: MoveStatus::Success,
            source,
            destination: Some(destination),
            category,
            error: None,
        }
    }

    pub fn dry_run(source: PathBuf, destination: PathBuf, category: Option<String>) -> Self {
        Self {
            status: MoveStatus::DryRun,
            source,
            destination: Some(destination),
            category,
            error: None,
        }
    }

    pub fn failed(source: PathBuf, category: Option<String>, error: MoveError) -> Self {
        Self {
            status: MoveStatus::Failed,
            source,
            destination: None,
            category,
            error: Some(error),
        }
    }

    pub fn skipped(source: PathBuf) -> Self {
        Self {
            status: MoveStatus::Skipped,
            source,
            destination: None,
            category: None,
            error: None,
        }
    }

    pub fn status(&self) -> MoveStatus {
        self.status
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn error(&self) -> Option<&MoveError> {
        self.error.as_ref()
    }

    pub fn is_success(&self) -> bool {
        self.status == MoveStatus::Success
    }

    pub fn is_failed(&self) -> bool {
        self.status == MoveStatus::Failed
    }
}

/// Run statistics, updated exactly once per file through [`RunStatistics::record`]
#[derive(Debug, Clone, Default)]
pub struct RunStatistics {
    fallback_category: String,
    processed: usize,
    moved: usize,
    failed: usize,
    skipped: usize,
    unknown: usize,
    categories: BTreeSet<String>,
    errors: Vec<(PathBuf, MoveError)>,
}

impl RunStatistics {
    /// Create an empty accumulator; files placed in `fallback_category` count as unknown
    pub fn new(fallback_category: impl Into<String>) -> Self {
        Self {
            fallback_category: fallback_category.into(),
            ..Self::default()
        }
    }

    /// Account for one file
    ///
    /// Dry-run outcomes count as moved so that the processed total always
    /// equals moved + failed + skipped.
    pub fn record(&mut self, outcome: &MoveOutcome) {
        self.processed += 1;

        match outcome.status() {
            MoveStatus::Success | MoveStatus::DryRun => {
                self.moved += 1;
                if let Some(category) = outcome.category() {
                    self.categories.insert(category.to_string());
                    if category == self.fallback_category {
                        self.unknown += 1;
                    }
                }
            }
            MoveStatus::Failed => {
                self.failed += 1;
                if let Some(error) = outcome.error() {
                    self.errors
                        .push((outcome.source().to_path_buf(), error.clone()));
                }
            }
            MoveStatus::Skipped => {
                self.skipped += 1;
            }
        }
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn summary(&self) -> String {
        format!(
            "Processed: {}, Moved: {}, Skipped: {}, Failed: {}, Unknown: {}",
            self.processed, self.moved, self.skipped, self.failed, self.unknown
        )
    }
}

/// Final snapshot of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub processed: usize,
    pub moved: usize,
    pub failed: usize,
    pub skipped: usize,
    pub unknown: usize,
    pub categories: BTreeSet<String>,
    pub errors: Vec<(PathBuf, MoveError)>,
    #[serde(rename = "duration_seconds", serialize_with = "serialize_secs")]
    pub duration: Duration,
    pub started_at: DateTime<Utc>,
    pub dry_run: bool,
    pub interrupted: bool,
}

impl RunResult {
    pub fn from_stats(
        stats: RunStatistics,
        started_at: DateTime<Utc>,
        duration: Duration,
        dry_run: bool,
        interrupted: bool,
    ) -> Self {
        Self {
            processed: stats.processed,
            moved: stats.moved,
            failed: stats.failed,
            skipped: stats.skipped,
            unknown: stats.unknown,
            categories: stats.categories,
            errors: stats.errors,
            duration,
            started_at,
            dry_run,
            interrupted,
        }
    }

    /// True when no file failed
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}
