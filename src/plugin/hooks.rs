//! Hooks around the move stage
//!
//! A [`FileFilter`] decides during discovery whether a file takes part in a
//! run at all. A [`PostProcessor`] observes each outcome once the move stage
//! has dealt with the file. Setup belongs in the hook's constructor and
//! teardown in its `Drop` impl.

use crate::model::{FileDescriptor, MoveOutcome, MoveStatus};
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::{debug, warn};

/// Decides whether a discovered file is organised
pub trait FileFilter: Send + Sync {
    fn name(&self) -> &str;

    /// False leaves the file in place; it is not counted by the run
    fn should_process(&self, file: &FileDescriptor) -> bool;
}

/// Observes the outcome of every file that reached the move stage
///
/// Dry-run outcomes are delivered too, with [`MoveStatus::DryRun`]. Errors
/// and panics are logged and never change the outcome.
pub trait PostProcessor: Send + Sync {
    fn name(&self) -> &str;

    fn process(&self, outcome: &MoveOutcome, original: &FileDescriptor) -> anyhow::Result<()>;
}

/// Ordered filter and post-processor lists
#[derive(Default)]
pub struct Hooks {
    filters: Vec<Box<dyn FileFilter>>,
    post_processors: Vec<Box<dyn PostProcessor>>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_filter(&mut self, filter: Box<dyn FileFilter>) {
        self.filters.push(filter);
    }

    pub fn add_post_processor(&mut self, processor: Box<dyn PostProcessor>) {
        self.post_processors.push(processor);
    }

    /// True when every filter accepts `file`
    ///
    /// A filter that panics rejects the file.
    pub fn accepts(&self, file: &FileDescriptor) -> bool {
        self.filters.iter().all(|filter| {
            match catch_unwind(AssertUnwindSafe(|| filter.should_process(file))) {
                Ok(true) => true,
                Ok(false) => {
                    debug!(filter = filter.name(), file = %file.name, "Filtered out");
                    false
                }
                Err(_) => {
                    warn!(filter = filter.name(), file = %file.name, "Filter panicked, leaving file in place");
                    false
                }
            }
        })
    }

    /// Hand `outcome` to every post-processor in registration order
    ///
    /// Skipped files never reached the move stage and are not delivered.
    pub fn after_move(&self, outcome: &MoveOutcome, original: &FileDescriptor) {
        if outcome.status() == MoveStatus::Skipped {
            return;
        }

        for processor in &self.post_processors {
            match catch_unwind(AssertUnwindSafe(|| processor.process(outcome, original))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(
                    processor = processor.name(),
                    file = %original.name,
                    error = %e,
                    "Post-processor failed"
                ),
                Err(_) => warn!(
                    processor = processor.name(),
                    file = %original.name,
                    "Post-processor panicked"
                ),
            }
        }
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("filters", &self.filters.iter().map(|h| h.name()).collect::<Vec<_>>())
            .field(
                "post_processors",
                &self.post_processors.iter().map(|h| h.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
