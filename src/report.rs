//! Run lifecycle callbacks
//!
//! The organiser notifies a [`Reporter`] as a run progresses. Rendering is up
//! to the implementation; every method defaults to a no-op.

use crate::model::{FileDescriptor, MoveOutcome, MoveStatus, RunResult};
use tracing::{debug, error, info, warn};

/// Receives run lifecycle events
///
/// For each file, `on_file_start` is always followed by `on_file_done` before
/// the next file starts.
pub trait Reporter {
    fn on_run_start(&mut self, _total_files: usize) {}
    fn on_file_start(&mut self, _file: &FileDescriptor) {}
    fn on_file_done(&mut self, _outcome: &MoveOutcome) {}
    fn on_run_complete(&mut self, _result: &RunResult) {}
    fn on_error(&mut self, _cause: &dyn std::error::Error, _file: Option<&FileDescriptor>) {}
}

/// Reporter that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl Reporter for SilentReporter {}

/// Reporter that forwards events to `tracing`
#[derive(Debug, Default)]
pub struct LogReporter {
    total: usize,
    done: usize,
}

impl LogReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Reporter for LogReporter {
    fn on_run_start(&mut self, total_files: usize) {
        self.total = total_files;
        self.done = 0;
        info!(total_files, "Starting organisation run");
    }

    fn on_file_start(&mut self, file: &FileDescriptor) {
        debug!(path = %file.path.display(), size = file.size, "Processing file");
    }

    fn on_file_done(&mut self, outcome: &MoveOutcome) {
        self.done += 1;
        let progress = format!("{}/{}", self.done, self.total);
        match outcome.status() {
            MoveStatus::Success | MoveStatus::DryRun => {
                let destination = outcome
                    .destination()
                    .map(|d| d.display().to_string())
                    .unwrap_or_default();
                debug!(
                    %progress,
                    source = %outcome.source().display(),
                    %destination,
                    category = outcome.category().unwrap_or_default(),
                    status = ?outcome.status(),
                    "File processed"
                );
            }
            MoveStatus::Skipped => {
                debug!(%progress, source = %outcome.source().display(), "Already organised");
            }
            MoveStatus::Failed => {
                warn!(%progress, source = %outcome.source().display(), "File failed");
            }
        }
    }

    fn on_run_complete(&mut self, result: &RunResult) {
        info!(
            processed = result.processed,
            moved = result.moved,
            failed = result.failed,
            skipped = result.skipped,
            unknown = result.unknown,
            duration_secs = result.duration.as_secs_f64(),
            dry_run = result.dry_run,
            interrupted = result.interrupted,
            "Organisation run finished"
        );
    }

    /// File failures were already logged where they happened
    fn on_error(&mut self, cause: &dyn std::error::Error, file: Option<&FileDescriptor>) {
        match file {
            Some(file) => debug!(path = %file.path.display(), error = %cause, "File error"),
            None => error!(error = %cause, "Error"),
        }
    }
}
