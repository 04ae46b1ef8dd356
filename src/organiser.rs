//! Run orchestration
//!
//! An [`Organiser`] discovers files under a root directory, skips the ones
//! already sitting in a category folder, categorises the rest and moves each
//! into `root/<category>/`. Files are processed one at a time. Cancellation
//! is checked between files, so a move is never interrupted halfway.

use crate::categoriser::{Categoriser, CategoryRegistry};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{FileDescriptor, MoveOutcome, RunResult, RunStatistics};
use crate::mover::{MoveRequest, Mover};
use crate::plugin::{
    ClassifierPlugin, ExtensionPlugin, FileFilter, Hooks, MagicPlugin, MimePlugin,
    PluginRegistry, PostProcessor, RulePlugin,
};
use crate::report::Reporter;
use crate::validate::{validate_category_name, validate_directory};
use chrono::Utc;
use glob::{MatchOptions, Pattern};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{Level, debug, info, span, warn};
use walkdir::{DirEntry, WalkDir};

/// Shared flag used to stop a run from another context (e.g. a signal handler)
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Build the categoriser described by `config`
///
/// Filename rules come first, then the extension, magic-number and MIME
/// classifiers. Plugins named in `disabled_plugins` stay registered but
/// disabled.
pub fn build_categoriser(config: &Config) -> Result<Categoriser> {
    let mut registry = PluginRegistry::new();

    for plugin in RulePlugin::grouped(&config.rules)? {
        registry.register(Box::new(plugin));
    }

    let builtins: Vec<Box<dyn ClassifierPlugin>> = vec![
        Box::new(ExtensionPlugin::new(&config.extensions)),
        Box::new(MagicPlugin::default()),
        Box::new(MimePlugin::default()),
    ];
    for plugin in builtins {
        registry.register(plugin);
    }

    for name in &config.disabled_plugins {
        if !registry.set_enabled(name, false) {
            warn!(plugin = %name, "Cannot disable unknown plugin");
        }
    }

    let mut metadata = CategoryRegistry::with_defaults();
    for meta in &config.categories {
        metadata.register(meta.clone());
    }

    Ok(Categoriser::new(registry, config.fallback_category.as_str()).with_metadata(metadata))
}

/// Sorts the files of one directory tree into category folders
#[derive(Debug)]
pub struct Organiser {
    root: PathBuf,
    include_hidden: bool,
    exclude: Vec<Pattern>,
    dry_run: bool,
    reuse_collision_cache: bool,
    categoriser: Categoriser,
    mover: Mover,
    hooks: Hooks,
    cancel: CancelToken,
}

impl Organiser {
    /// Create an organiser with the categoriser described by `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let categoriser = build_categoriser(config)?;
        Self::new(config, categoriser)
    }

    /// Create an organiser using a caller-supplied categoriser
    ///
    /// Fails before touching the disk when the root directory is unusable, an
    /// exclusion pattern does not compile or a declared category name is
    /// invalid.
    pub fn new(config: &Config, categoriser: Categoriser) -> Result<Self> {
        let root = if config.validate_paths {
            validate_directory(&config.directory)?
        } else {
            resolve_directory(&config.directory)?
        };

        let exclude = config
            .exclude_patterns
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|source| Error::InvalidPattern {
                    pattern: p.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        for category in categoriser.all_categories() {
            validate_category_name(category)?;
        }

        debug!(
            root = %root.display(),
            categories = categoriser.all_categories().len(),
            plugins = categoriser.registry().len(),
            "Organiser ready"
        );

        Ok(Self {
            root,
            include_hidden: config.include_hidden,
            exclude,
            dry_run: config.dry_run,
            reuse_collision_cache: config.reuse_collision_cache,
            categoriser,
            mover: Mover::new(config.move_options()),
            hooks: Hooks::new(),
            cancel: CancelToken::new(),
        })
    }

    /// Use `token` to cancel this organiser's runs
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn categoriser(&self) -> &Categoriser {
        &self.categoriser
    }

    /// Only files every filter accepts are discovered
    pub fn with_filter(mut self, filter: impl FileFilter + 'static) -> Self {
        self.hooks.add_filter(Box::new(filter));
        self
    }

    /// Called with each file's outcome, in registration order
    pub fn with_post_processor(mut self, processor: impl PostProcessor + 'static) -> Self {
        self.hooks.add_post_processor(Box::new(processor));
        self
    }

    /// Files that a run would consider, in path order
    pub fn discover(&self) -> Vec<FileDescriptor> {
        self.scan().0
    }

    /// Walk the root; the flag is true when cancellation cut the walk short
    ///
    /// Unless hidden entries are included, a hidden directory is pruned with
    /// everything below it.
    fn scan(&self) -> (Vec<FileDescriptor>, bool) {
        let mut files = Vec::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || self.include_hidden || !is_hidden(e));

        for entry in walker {
            if self.cancel.is_cancelled() {
                debug!(found = files.len(), "Discovery cancelled");
                return (files, true);
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_symlink() {
                debug!(path = %entry.path().display(), "Skipping symbolic link");
                continue;
            }
            if !file_type.is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            if self.is_excluded(relative) {
                debug!(path = %relative.display(), "Excluded by pattern");
                continue;
            }

            match FileDescriptor::from_path(entry.path()) {
                Ok(descriptor) if self.hooks.accepts(&descriptor) => files.push(descriptor),
                Ok(_) => {}
                Err(e) => warn!(path = %entry.path().display(), error = %e, "Cannot stat file"),
            }
        }

        (files, false)
    }

    fn is_excluded(&self, relative: &Path) -> bool {
        let options = MatchOptions::new();
        self.exclude
            .iter()
            .any(|pattern| pattern.matches_path_with(relative, options))
    }

    /// A file whose first root-relative component is a known category was
    /// placed by an earlier run
    fn is_presorted(&self, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return false;
        };
        let mut components = relative.components();
        match (components.next(), components.next()) {
            (Some(first), Some(_)) => first
                .as_os_str()
                .to_str()
                .is_some_and(|name| self.categoriser.all_categories().contains(name)),
            _ => false,
        }
    }

    /// Run the organisation pipeline
    ///
    /// On cancellation the statistics gathered so far are finalised and
    /// returned inside [`Error::Interrupted`].
    pub fn run(&mut self, reporter: &mut dyn Reporter) -> Result<RunResult> {
        let _span = span!(
            Level::INFO,
            "organiser_run",
            root = %self.root.display(),
            dry_run = self.dry_run
        )
        .entered();

        let started_at = Utc::now();
        let timer = Instant::now();

        if !self.reuse_collision_cache {
            self.mover.clear_cache();
        }

        info!("Scanning directory...");
        let (files, mut interrupted) = self.scan();
        info!(count = files.len(), "Found files");

        reporter.on_run_start(files.len());
        let mut stats = RunStatistics::new(self.categoriser.fallback());

        if !interrupted {
            for file in &files {
                if self.cancel.is_cancelled() {
                    warn!(processed = stats.processed(), "Run interrupted");
                    interrupted = true;
                    break;
                }

                let _file_span =
                    span!(Level::DEBUG, "organise_file", path = %file.path.display()).entered();

                reporter.on_file_start(file);
                let outcome = self.organise_file(file);
                self.hooks.after_move(&outcome, file);
                stats.record(&outcome);
                if let Some(error) = outcome.error() {
                    reporter.on_error(error, Some(file));
                }
                reporter.on_file_done(&outcome);
            }
        }

        let result = RunResult::from_stats(
            stats,
            started_at,
            timer.elapsed(),
            self.dry_run,
            interrupted,
        );

        // Dry-run reservations must not leak into the next run
        if self.dry_run {
            self.mover.clear_cache();
        }

        reporter.on_run_complete(&result);
        info!(
            processed = result.processed,
            moved = result.moved,
            failed = result.failed,
            skipped = result.skipped,
            duration_ms = result.duration.as_millis() as u64,
            "Run complete"
        );

        if interrupted {
            return Err(Error::Interrupted(Box::new(result)));
        }
        Ok(result)
    }

    fn organise_file(&mut self, file: &FileDescriptor) -> MoveOutcome {
        if self.is_presorted(&file.path) {
            debug!(path = %file.path.display(), "Already in a category folder");
            return MoveOutcome::skipped(file.path.clone());
        }

        let category = self.categoriser.categorise(file);
        if let Err(e) = validate_category_name(&category) {
            warn!(path = %file.path.display(), category = %category, error = %e, "Rejected category");
            return MoveOutcome::failed(file.path.clone(), Some(category), e.into());
        }

        let destination = self.root.join(&category);
        self.mover.move_file(
            MoveRequest::new(&file.path, &destination)
                .with_category(&category)
                .dry_run(self.dry_run),
        )
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

/// Canonicalise without the safety checks, still requiring a directory
fn resolve_directory(directory: &Path) -> Result<PathBuf> {
    let resolved = fs::canonicalize(directory).map_err(|e| Error::InvalidDirectory {
        path: directory.to_path_buf(),
        reason: format!("directory does not exist or cannot be resolved: {}", e),
    })?;
    if !resolved.is_dir() {
        return Err(Error::InvalidDirectory {
            path: resolved,
            reason: "path is not a directory".into(),
        });
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MoveError;
    use crate::model::MoveStatus;
    use crate::plugin::FilenameRule;
    use crate::report::SilentReporter;
    use crate::report::tests::Recorder;
    use std::collections::BTreeSet;
    use tempfile::{TempDir, tempdir};

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn simple_categoriser() -> Categoriser {
        let mut registry = PluginRegistry::new();
        registry.register(Box::new(ExtensionPlugin::new([
            (".txt", "documents"),
            (".jpg", "images"),
        ])));
        Categoriser::new(registry, "Uncategorised")
    }

    fn simple_organiser(root: &TempDir, dry_run: bool) -> Organiser {
        let mut config = Config::for_directory(root.path());
        config.dry_run = dry_run;
        Organiser::new(&config, simple_categoriser()).unwrap()
    }

    fn tree(root: &Path) -> BTreeSet<String> {
        WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .map(|e| {
                let e = e.unwrap();
                e.path().strip_prefix(root).unwrap().to_string_lossy().into_owned()
            })
            .collect()
    }

    #[derive(Default)]
    struct Destinations(Vec<(String, Option<PathBuf>, MoveStatus)>);

    impl Reporter for Destinations {
        fn on_file_done(&mut self, outcome: &MoveOutcome) {
            self.0.push((
                outcome.source().to_string_lossy().into_owned(),
                outcome.destination().map(Path::to_path_buf),
                outcome.status(),
            ));
        }
    }

    #[test]
    fn test_sorts_into_category_folders() {
        let root = tempdir().unwrap();
        write(&root.path().join("a.txt"), "text");
        write(&root.path().join("b.jpg"), "jpeg");

        let result = simple_organiser(&root, false)
            .run(&mut SilentReporter)
            .unwrap();

        assert_eq!(result.processed, 2);
        assert_eq!(result.moved, 2);
        assert_eq!(result.failed, 0);
        assert!(result.success());
        assert_eq!(
            result.categories,
            BTreeSet::from(["documents".to_string(), "images".to_string()])
        );
        assert!(root.path().join("documents/a.txt").is_file());
        assert!(root.path().join("images/b.jpg").is_file());
        assert!(!root.path().join("a.txt").exists());
    }

    #[test]
    fn test_collision_with_existing_file() {
        let root = tempdir().unwrap();
        write(&root.path().join("documents/a.txt"), "old");
        write(&root.path().join("a.txt"), "new");

        let result = simple_organiser(&root, false)
            .run(&mut SilentReporter)
            .unwrap();

        assert_eq!(result.moved, 1);
        assert_eq!(result.skipped, 1);
        assert_eq!(fs::read_to_string(root.path().join("documents/a.txt")).unwrap(), "old");
        assert_eq!(fs::read_to_string(root.path().join("documents/a(1).txt")).unwrap(), "new");
    }

    #[test]
    fn test_same_names_from_different_folders() {
        let root = tempdir().unwrap();
        for dir in ["x", "y", "z"] {
            write(&root.path().join(dir).join("notes.txt"), dir);
        }

        let result = simple_organiser(&root, false)
            .run(&mut SilentReporter)
            .unwrap();

        assert_eq!(result.moved, 3);
        let docs: BTreeSet<_> = fs::read_dir(root.path().join("documents"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            docs,
            BTreeSet::from(["notes.txt".into(), "notes(1).txt".into(), "notes(2).txt".into()])
        );
    }

    /// Deletes a file right after it has been announced, before it is moved
    struct Vanisher(&'static str);

    impl Reporter for Vanisher {
        fn on_file_start(&mut self, file: &FileDescriptor) {
            if file.name == self.0 {
                fs::remove_file(&file.path).unwrap();
            }
        }
    }

    #[test]
    fn test_vanished_source_fails_without_stopping_run() {
        let root = tempdir().unwrap();
        for name in ["a.txt", "b.txt", "c.txt"] {
            write(&root.path().join(name), name);
        }

        let result = simple_organiser(&root, false)
            .run(&mut Vanisher("b.txt"))
            .unwrap();

        assert_eq!(result.processed, 3);
        assert_eq!(result.moved, 2);
        assert_eq!(result.failed, 1);
        assert!(!result.success());
        let (path, cause) = &result.errors[0];
        assert!(path.ends_with("b.txt"));
        assert!(matches!(cause, MoveError::NotFound { .. }));
        assert!(root.path().join("documents/a.txt").exists());
        assert!(root.path().join("documents/c.txt").exists());
    }

    #[test]
    fn test_dry_run_is_idempotent() {
        let root = tempdir().unwrap();
        write(&root.path().join("a.txt"), "a");
        write(&root.path().join("sub/a.txt"), "a again");
        write(&root.path().join("b.jpg"), "b");
        let before = tree(root.path());

        let mut organiser = simple_organiser(&root, true);
        let mut first = Destinations::default();
        let first_result = organiser.run(&mut first).unwrap();
        let mut second = Destinations::default();
        let second_result = organiser.run(&mut second).unwrap();

        assert_eq!(tree(root.path()), before);
        assert_eq!(first.0, second.0);
        assert!(first.0.iter().all(|(_, _, status)| *status == MoveStatus::DryRun));
        assert!(first_result.dry_run);
        assert_eq!(first_result.moved, 3);
        assert_eq!(first_result.categories, second_result.categories);

        // Both a.txt files are predicted distinct names
        let targets: BTreeSet<_> = first.0.iter().filter_map(|(_, d, _)| d.clone()).collect();
        assert_eq!(targets.len(), 3);
    }

    #[test]
    fn test_second_run_skips_organised_files() {
        let root = tempdir().unwrap();
        write(&root.path().join("a.txt"), "a");
        write(&root.path().join("mystery.zzqx"), "???");

        let mut organiser = simple_organiser(&root, false);
        let first = organiser.run(&mut SilentReporter).unwrap();
        assert_eq!(first.moved, 2);

        let mut outcomes = Destinations::default();
        let second = organiser.run(&mut outcomes).unwrap();
        assert_eq!(second.processed, 2);
        assert_eq!(second.skipped, 2);
        assert_eq!(second.moved, 0);
        assert!(outcomes.0.iter().all(|(_, _, s)| *s == MoveStatus::Skipped));
    }

    #[test]
    fn test_unmatched_file_uses_fallback() {
        let root = tempdir().unwrap();
        write(&root.path().join("mystery.zzqx"), "???");

        let result = simple_organiser(&root, false)
            .run(&mut SilentReporter)
            .unwrap();

        assert_eq!(result.unknown, 1);
        assert!(result.categories.contains("Uncategorised"));
        assert!(root.path().join("Uncategorised/mystery.zzqx").is_file());
    }

    #[test]
    fn test_accounting_adds_up() {
        let root = tempdir().unwrap();
        write(&root.path().join("documents/old.txt"), "sorted");
        write(&root.path().join("a.txt"), "a");
        write(&root.path().join("b.jpg"), "b");
        write(&root.path().join("c.txt"), "c");
        write(&root.path().join("d.bin"), "d");

        let result = simple_organiser(&root, false)
            .run(&mut Vanisher("c.txt"))
            .unwrap();

        assert_eq!(result.processed, 5);
        assert_eq!(result.processed, result.moved + result.failed + result.skipped);
        assert_eq!((result.moved, result.failed, result.skipped), (3, 1, 1));
    }

    /// Cancels the run once the first file is done
    struct CancelAfterFirst(CancelToken);

    impl Reporter for CancelAfterFirst {
        fn on_file_done(&mut self, _outcome: &MoveOutcome) {
            self.0.cancel();
        }
    }

    #[test]
    fn test_interruption_returns_partial_result() {
        let root = tempdir().unwrap();
        for name in ["a.txt", "b.txt", "c.txt"] {
            write(&root.path().join(name), name);
        }

        let mut organiser = simple_organiser(&root, false);
        let mut reporter = CancelAfterFirst(organiser.cancel_token());
        let err = organiser.run(&mut reporter).unwrap_err();

        let partial = err.partial_result().unwrap();
        assert!(partial.interrupted);
        assert_eq!(partial.processed, 1);
        assert_eq!(partial.moved, 1);
        assert!(root.path().join("documents/a.txt").exists());
        assert!(root.path().join("b.txt").exists());
        assert!(root.path().join("c.txt").exists());
    }

    #[test]
    fn test_cancelled_before_start() {
        let root = tempdir().unwrap();
        write(&root.path().join("a.txt"), "a");

        let token = CancelToken::new();
        token.cancel();
        let mut organiser = simple_organiser(&root, false).with_cancel_token(token);
        let err = organiser.run(&mut SilentReporter).unwrap_err();

        assert_eq!(err.partial_result().map(|r| r.processed), Some(0));
        assert!(root.path().join("a.txt").exists());
    }

    #[test]
    fn test_reporter_event_order() {
        let root = tempdir().unwrap();
        write(&root.path().join("a.txt"), "a");
        write(&root.path().join("b.jpg"), "b");

        let mut recorder = Recorder::default();
        simple_organiser(&root, false).run(&mut recorder).unwrap();

        assert_eq!(
            recorder.events,
            [
                "start:2",
                "file:a.txt",
                "done:a.txt:Success",
                "file:b.jpg",
                "done:b.jpg:Success",
                "complete:2",
            ]
        );
    }

    #[test]
    fn test_errors_are_reported_before_done() {
        let root = tempdir().unwrap();
        write(&root.path().join("a.txt"), "a");

        struct Both(Vanisher, Recorder);
        impl Reporter for Both {
            fn on_file_start(&mut self, file: &FileDescriptor) {
                self.0.on_file_start(file);
                self.1.on_file_start(file);
            }
            fn on_file_done(&mut self, outcome: &MoveOutcome) {
                self.1.on_file_done(outcome);
            }
            fn on_error(&mut self, cause: &dyn std::error::Error, file: Option<&FileDescriptor>) {
                self.1.on_error(cause, file);
            }
        }

        let mut reporter = Both(Vanisher("a.txt"), Recorder::default());
        simple_organiser(&root, false).run(&mut reporter).unwrap();
        assert_eq!(
            reporter.1.events,
            ["file:a.txt", "error:a.txt", "done:a.txt:Failed"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_discovery_filters() {
        let root = tempdir().unwrap();
        write(&root.path().join("visible.txt"), "v");
        write(&root.path().join(".hidden.txt"), "h");
        write(&root.path().join(".cache/inner.txt"), "c");
        write(&root.path().join("download.part"), "p");
        write(&root.path().join("keep/stay.txt"), "k");
        std::os::unix::fs::symlink(
            root.path().join("visible.txt"),
            root.path().join("link.txt"),
        )
        .unwrap();

        let mut config = Config::for_directory(root.path());
        config.exclude_patterns = vec!["*.part".into(), "keep/*".into()];
        let organiser = Organiser::new(&config, simple_categoriser()).unwrap();

        let names: Vec<_> = organiser.discover().into_iter().map(|f| f.name).collect();
        assert_eq!(names, ["visible.txt"]);

        config.include_hidden = true;
        let organiser = Organiser::new(&config, simple_categoriser()).unwrap();
        let names: BTreeSet<_> = organiser.discover().into_iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            BTreeSet::from([".hidden.txt".into(), "inner.txt".into(), "visible.txt".into()])
        );
    }

    #[test]
    fn test_invalid_declared_category_is_fatal() {
        let root = tempdir().unwrap();
        let mut config = Config::for_directory(root.path());
        config.rules = vec![FilenameRule::new("*.txt", "bad name")];

        let err = Organiser::from_config(&config).unwrap_err();
        assert!(matches!(err, Error::InvalidCategory { .. }));
    }

    /// Returns a category it never declared
    struct Sneaky;

    impl ClassifierPlugin for Sneaky {
        fn name(&self) -> &str {
            "sneaky"
        }

        fn classify(&self, _file: &FileDescriptor) -> anyhow::Result<Option<String>> {
            Ok(Some("../escape".into()))
        }
    }

    #[test]
    fn test_invalid_runtime_category_fails_file() {
        let root = tempdir().unwrap();
        write(&root.path().join("a.txt"), "a");

        let mut registry = PluginRegistry::new();
        registry.register(Box::new(Sneaky));
        let categoriser = Categoriser::new(registry, "Uncategorised");
        let mut organiser =
            Organiser::new(&Config::for_directory(root.path()), categoriser).unwrap();

        let result = organiser.run(&mut SilentReporter).unwrap();
        assert_eq!(result.failed, 1);
        assert!(matches!(result.errors[0].1, MoveError::InvalidCategory { .. }));
        assert!(root.path().join("a.txt").exists());
        assert!(!root.path().parent().unwrap().join("escape").exists());
    }

    #[test]
    fn test_invalid_exclude_pattern() {
        let root = tempdir().unwrap();
        let mut config = Config::for_directory(root.path());
        config.exclude_patterns = vec!["[oops".into()];
        assert!(matches!(
            Organiser::new(&config, simple_categoriser()),
            Err(Error::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_missing_root_is_rejected() {
        let root = tempdir().unwrap();
        let mut config = Config::for_directory(root.path().join("absent"));
        assert!(matches!(
            Organiser::new(&config, simple_categoriser()),
            Err(Error::InvalidDirectory { .. })
        ));

        config.validate_paths = false;
        assert!(matches!(
            Organiser::new(&config, simple_categoriser()),
            Err(Error::InvalidDirectory { .. })
        ));
    }

    #[test]
    fn test_from_config_uses_builtin_plugins() {
        let root = tempdir().unwrap();
        write(&root.path().join("photo.jpg"), "jpeg");
        write(&root.path().join("archive.tar.gz"), "tarball");
        write(&root.path().join("scan"), "%PDF-1.4 body");

        let mut config = Config::for_directory(root.path());
        config.disabled_plugins = vec!["mime_categoriser".into()];
        let mut organiser = Organiser::from_config(&config).unwrap();

        let summary = organiser.categoriser().summary();
        assert_eq!(summary.total_plugins, 3);
        assert_eq!(summary.enabled_plugins, 2);

        organiser.run(&mut SilentReporter).unwrap();
        assert!(root.path().join("images/photo.jpg").exists());
        assert!(root.path().join("archives/archive.tar.gz").exists());
        assert!(root.path().join("documents/scan").exists());
    }

    #[test]
    fn test_fresh_collision_index_sees_external_files() {
        let root = tempdir().unwrap();
        write(&root.path().join("a.txt"), "a");

        let mut config = Config::for_directory(root.path());
        config.reuse_collision_cache = false;
        let mut organiser = Organiser::new(&config, simple_categoriser()).unwrap();
        organiser.run(&mut SilentReporter).unwrap();
        let docs = organiser.root().join("documents");
        assert!(docs.join("a.txt").is_file());

        // Appears between runs without going through the organiser
        write(&docs.join("b.txt"), "external");
        write(&organiser.root().join("b.txt"), "incoming");

        let mut reporter = Destinations::default();
        organiser.run(&mut reporter).unwrap();

        let moved: Vec<_> = reporter
            .0
            .iter()
            .filter(|(_, _, status)| *status == MoveStatus::Success)
            .collect();
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].1.as_deref(), Some(docs.join("b(1).txt").as_path()));
        assert_eq!(fs::read_to_string(docs.join("b.txt")).unwrap(), "external");
        assert_eq!(fs::read_to_string(docs.join("b(1).txt")).unwrap(), "incoming");
    }

    struct SkipLarge;

    impl FileFilter for SkipLarge {
        fn name(&self) -> &str {
            "skip_large"
        }

        fn should_process(&self, file: &FileDescriptor) -> bool {
            file.size < 5
        }
    }

    struct Journal(Arc<std::sync::Mutex<Vec<String>>>);

    impl PostProcessor for Journal {
        fn name(&self) -> &str {
            "journal"
        }

        fn process(&self, outcome: &MoveOutcome, original: &FileDescriptor) -> anyhow::Result<()> {
            let destination = outcome
                .destination()
                .and_then(Path::file_name)
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.0
                .lock()
                .unwrap()
                .push(format!("{}->{}", original.name, destination));
            Ok(())
        }
    }

    #[test]
    fn test_filters_and_post_processors() {
        let root = tempdir().unwrap();
        write(&root.path().join("small.txt"), "tiny");
        write(&root.path().join("large.txt"), "far too large");
        write(&root.path().join("documents/old.txt"), "old");

        let journal = Arc::new(std::sync::Mutex::new(Vec::new()));
        let config = Config::for_directory(root.path());
        let mut organiser = Organiser::new(&config, simple_categoriser())
            .unwrap()
            .with_filter(SkipLarge)
            .with_post_processor(Journal(journal.clone()));

        let names: Vec<_> = organiser.discover().into_iter().map(|f| f.name).collect();
        assert_eq!(names, ["old.txt", "small.txt"]);

        let result = organiser.run(&mut SilentReporter).unwrap();
        assert_eq!(result.processed, 2);
        assert_eq!(result.moved, 1);
        assert_eq!(result.skipped, 1);
        assert!(root.path().join("large.txt").is_file());
        assert!(root.path().join("documents/small.txt").is_file());

        // The already-sorted file was skipped and never reached the move stage
        assert_eq!(*journal.lock().unwrap(), ["small.txt->small.txt"]);
    }
}
