//! Collision-safe file relocation
//!
//! Handles the move of a single file into a destination directory:
//! - Unique filename allocation through a per-directory [`CollisionIndex`]
//! - Atomic rename, with a copy + verify + rename fallback across filesystems
//! - Optional content-hash verification of the result
//!
//! Every failure is returned as a `Failed` [`MoveOutcome`]; nothing panics or
//! propagates past [`Mover::move_file`].

use crate::error::MoveError;
use crate::hash;
use crate::model::MoveOutcome;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Highest numeric suffix tried before giving up on a name
pub const DEFAULT_MAX_NAME_ATTEMPTS: usize = 10_000;

/// Longest filename, in encoded bytes, the mover will produce
pub const DEFAULT_MAX_FILENAME_BYTES: usize = 255;

/// Buffer size used when copying file contents (256KB)
const COPY_BUFFER_SIZE: usize = 256 * 1024;

/// Behaviour switches for the mover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOptions {
    /// Use rename, falling back to copy-to-temp + rename across filesystems
    pub atomic: bool,
    /// Compare content hashes of source and destination
    pub verify: bool,
    /// Keep permissions and timestamps when a copy is needed
    pub preserve_metadata: bool,
    /// Create the destination directory and its ancestors
    pub create_dirs: bool,
    pub max_name_attempts: usize,
    pub max_filename_bytes: usize,
}

impl Default for MoveOptions {
    fn default() -> Self {
        Self {
            atomic: true,
            verify: true,
            preserve_metadata: true,
            create_dirs: true,
            max_name_attempts: DEFAULT_MAX_NAME_ATTEMPTS,
            max_filename_bytes: DEFAULT_MAX_FILENAME_BYTES,
        }
    }
}

/// Filenames already claimed in each destination directory
///
/// A directory is listed from disk the first time a name is reserved in it.
/// Reservations are added as names are handed out. Invalidating a directory
/// drops its entry so the next reservation re-reads the disk.
#[derive(Debug, Default)]
pub struct CollisionIndex {
    dirs: HashMap<PathBuf, HashSet<String>>,
}

impl CollisionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `desired` in `dir`, or the first free `name(N)ext` variant
    ///
    /// Every returned name is at most `max_bytes` long. A desired name over
    /// the limit has its stem shortened first.
    pub fn reserve(
        &mut self,
        dir: &Path,
        desired: &str,
        max_attempts: usize,
        max_bytes: usize,
    ) -> Result<String, MoveError> {
        let as_path = Path::new(desired);
        let stem = as_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| desired.to_string());
        let extension = as_path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let too_long = || MoveError::NameTooLong {
            name: desired.to_string(),
            max_bytes,
        };

        let base = if desired.len() <= max_bytes {
            desired.to_string()
        } else {
            fit_name(&stem, &extension, max_bytes).ok_or_else(too_long)?
        };

        let claimed = self.claimed_in(dir)?;
        if !claimed.contains(&base) {
            claimed.insert(base.clone());
            return Ok(base);
        }

        for count in 1..=max_attempts {
            let candidate =
                numbered_name(&stem, &extension, count, max_bytes).ok_or_else(too_long)?;
            if !claimed.contains(&candidate) {
                debug!(dir = %dir.display(), desired, candidate = %candidate, "Resolved filename collision");
                claimed.insert(candidate.clone());
                return Ok(candidate);
            }
        }

        Err(MoveError::UniqueNameExhausted {
            name: desired.to_string(),
            attempts: max_attempts,
        })
    }

    /// Whether `name` is currently claimed in an indexed directory
    pub fn is_claimed(&self, dir: &Path, name: &str) -> bool {
        self.dirs.get(dir).is_some_and(|names| names.contains(name))
    }

    pub fn is_indexed(&self, dir: &Path) -> bool {
        self.dirs.contains_key(dir)
    }

    pub fn invalidate(&mut self, dir: &Path) {
        if self.dirs.remove(dir).is_some() {
            debug!(dir = %dir.display(), "Invalidated collision cache");
        }
    }

    pub fn clear(&mut self) {
        self.dirs.clear();
        debug!("Cleared entire collision cache");
    }

    fn claimed_in(&mut self, dir: &Path) -> Result<&mut HashSet<String>, MoveError> {
        if !self.dirs.contains_key(dir) {
            let names = list_names(dir).map_err(|e| MoveError::from_io(dir, &e))?;
            self.dirs.insert(dir.to_path_buf(), names);
        }
        Ok(self.dirs.entry(dir.to_path_buf()).or_default())
    }
}

/// Names of every entry in `dir`; a missing directory has none
fn list_names(dir: &Path) -> io::Result<HashSet<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HashSet::new()),
        Err(e) => return Err(e),
    };

    let mut names = HashSet::new();
    for entry in entries {
        names.insert(entry?.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}

/// `stem(count)extension`, truncating the stem so the result fits in `max_bytes`
fn numbered_name(stem: &str, extension: &str, count: usize, max_bytes: usize) -> Option<String> {
    fit_name(stem, &format!("({}){}", count, extension), max_bytes)
}

/// `stem` followed by `tail`, shortening the stem to fit in `max_bytes`
///
/// `None` when not even one character of the stem fits.
fn fit_name(stem: &str, tail: &str, max_bytes: usize) -> Option<String> {
    let budget = max_bytes.checked_sub(tail.len())?;
    let kept = truncate_at_char_boundary(stem, budget);
    if kept.is_empty() && !stem.is_empty() {
        return None;
    }
    Some(format!("{}{}", kept, tail))
}

fn truncate_at_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// One move to perform
#[derive(Debug, Clone, Copy)]
pub struct MoveRequest<'a> {
    pub source: &'a Path,
    pub destination_dir: &'a Path,
    /// Target filename; the source's name when `None`
    pub desired_name: Option<&'a str>,
    pub category: Option<&'a str>,
    /// Overrides [`MoveOptions::verify`] when set
    pub verify: Option<bool>,
    pub dry_run: bool,
}

impl<'a> MoveRequest<'a> {
    pub fn new(source: &'a Path, destination_dir: &'a Path) -> Self {
        Self {
            source,
            destination_dir,
            desired_name: None,
            category: None,
            verify: None,
            dry_run: false,
        }
    }

    pub fn with_name(mut self, name: &'a str) -> Self {
        self.desired_name = Some(name);
        self
    }

    pub fn with_category(mut self, category: &'a str) -> Self {
        self.category = Some(category);
        self
    }

    pub fn verify(mut self, verify: bool) -> Self {
        self.verify = Some(verify);
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Filesystem primitives the mover relocates with
#[derive(Debug, Clone, Copy)]
struct FsOps {
    rename: fn(&Path, &Path) -> io::Result<()>,
    remove_file: fn(&Path) -> io::Result<()>,
}

impl Default for FsOps {
    fn default() -> Self {
        Self {
            rename: |from, to| fs::rename(from, to),
            remove_file: |path| fs::remove_file(path),
        }
    }
}

/// Moves files while tracking claimed names per destination directory
#[derive(Debug, Default)]
pub struct Mover {
    options: MoveOptions,
    collisions: CollisionIndex,
    ops: FsOps,
}

impl Mover {
    pub fn new(options: MoveOptions) -> Self {
        Self {
            options,
            collisions: CollisionIndex::new(),
            ops: FsOps::default(),
        }
    }

    #[cfg(test)]
    fn with_ops(mut self, ops: FsOps) -> Self {
        self.ops = ops;
        self
    }

    pub fn options(&self) -> &MoveOptions {
        &self.options
    }

    pub fn collisions(&self) -> &CollisionIndex {
        &self.collisions
    }

    /// Drop the collision state of one directory
    pub fn invalidate(&mut self, dir: &Path) {
        self.collisions.invalidate(dir);
    }

    /// Drop all collision state
    pub fn clear_cache(&mut self) {
        self.collisions.clear();
    }

    /// Move one file, reporting the result as an outcome
    ///
    /// On failure the destination directory's collision state is invalidated.
    pub fn move_file(&mut self, request: MoveRequest<'_>) -> MoveOutcome {
        let category = request.category.map(String::from);

        match self.try_move(&request) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    source = %request.source.display(),
                    destination_dir = %request.destination_dir.display(),
                    error = %e,
                    "Failed to move file"
                );
                self.collisions.invalidate(request.destination_dir);
                MoveOutcome::failed(request.source.to_path_buf(), category, e)
            }
        }
    }

    fn try_move(&mut self, request: &MoveRequest<'_>) -> Result<MoveOutcome, MoveError> {
        let source = request.source;
        let dir = request.destination_dir;
        let category = request.category.map(String::from);

        let metadata = fs::metadata(source).map_err(|e| MoveError::from_io(source, &e))?;
        if !metadata.is_file() {
            return Err(MoveError::NotAFile {
                path: source.to_path_buf(),
            });
        }

        let desired = match request.desired_name {
            Some(name) => name.to_string(),
            None => source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| MoveError::NotAFile {
                    path: source.to_path_buf(),
                })?,
        };

        let unique = self.collisions.reserve(
            dir,
            &desired,
            self.options.max_name_attempts,
            self.options.max_filename_bytes,
        )?;
        let dest = dir.join(&unique);

        if request.dry_run {
            info!(source = %source.display(), destination = %dest.display(), "[Dry Run] Would move file");
            return Ok(MoveOutcome::dry_run(source.to_path_buf(), dest, category));
        }

        if self.options.create_dirs {
            fs::create_dir_all(dir).map_err(|e| MoveError::from_io(dir, &e))?;
        } else if !dir.is_dir() {
            return Err(MoveError::DestinationMissing {
                path: dir.to_path_buf(),
            });
        }

        let verify = request.verify.unwrap_or(self.options.verify);
        if self.options.atomic {
            self.atomic_move(source, &dest, verify)?;
        } else {
            self.plain_move(source, &dest)?;
        }

        if verify {
            verify_move(source, &dest)?;
        }

        info!(source = %source.display(), destination = %dest.display(), "Moved file");
        Ok(MoveOutcome::success(source.to_path_buf(), dest, category))
    }

    /// Rename in place; across filesystems copy through a temporary sibling
    fn atomic_move(&self, source: &Path, dest: &Path, verify: bool) -> Result<(), MoveError> {
        match (self.ops.rename)(source, dest) {
            Ok(()) => {
                debug!(source = %source.display(), destination = %dest.display(), "Atomic rename");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                debug!(source = %source.display(), destination = %dest.display(), "Cross-filesystem move");
                copy_across(source, dest, self.options.preserve_metadata, verify, self.ops)
            }
            Err(e) => Err(relocation_error(source, dest, &e)),
        }
    }

    /// Rename, falling back to a direct copy + delete on any rename failure
    fn plain_move(&self, source: &Path, dest: &Path) -> Result<(), MoveError> {
        if (self.ops.rename)(source, dest).is_ok() {
            return Ok(());
        }

        let copied = File::create(dest)
            .and_then(|file| copy_contents(source, file))
            .and_then(|()| {
                if self.options.preserve_metadata {
                    copy_metadata(source, dest)?;
                }
                (self.ops.remove_file)(source)
            });

        copied.map_err(|e| {
            if source.exists() {
                remove_quietly(dest);
            }
            relocation_error(source, dest, &e)
        })
    }
}

/// Copy `source` to a temporary file next to `dest`, rename it into place and
/// delete the source
///
/// Until the final rename the temporary file is removed on every error path,
/// so `dest` is either absent or complete. If the source cannot be deleted
/// afterwards, `dest` is removed again and only the source remains.
fn copy_across(
    source: &Path,
    dest: &Path,
    preserve_metadata: bool,
    verify: bool,
    ops: FsOps,
) -> Result<(), MoveError> {
    let fail = |message: String| MoveError::CrossDeviceCopy {
        from: source.to_path_buf(),
        to: dest.to_path_buf(),
        message,
    };

    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    let temp = tempfile::Builder::new()
        .prefix(".organiser-")
        .suffix(".partial")
        .tempfile_in(dir)
        .map_err(|e| fail(format!("cannot create temporary file: {}", e)))?;

    let file = temp
        .reopen()
        .map_err(|e| fail(format!("cannot open temporary file: {}", e)))?;
    copy_contents(source, file).map_err(|e| fail(format!("copy failed: {}", e)))?;

    if preserve_metadata {
        copy_metadata(source, temp.path())
            .map_err(|e| fail(format!("cannot preserve metadata: {}", e)))?;
    }

    if verify {
        let identical = hash::same_content(source, temp.path())
            .map_err(|e| fail(format!("cannot verify copy: {}", e)))?;
        if !identical {
            return Err(MoveError::IntegrityMismatch {
                source_path: source.to_path_buf(),
                destination: temp.path().to_path_buf(),
            });
        }
    }

    temp.persist(dest)
        .map_err(|e| fail(format!("cannot rename temporary file into place: {}", e.error)))?;

    if let Err(e) = (ops.remove_file)(source) {
        remove_quietly(dest);
        return Err(fail(format!("cannot remove source after copy: {}", e)));
    }

    Ok(())
}

/// Attribute a failed relocation to the side that caused it
///
/// A missing source is reported against the source. With the source still in
/// place, the failure belongs to the destination.
fn relocation_error(source: &Path, dest: &Path, err: &io::Error) -> MoveError {
    if !source.exists() {
        return MoveError::from_io(source, err);
    }
    match err.kind() {
        io::ErrorKind::NotFound => MoveError::DestinationMissing {
            path: dest.parent().unwrap_or(dest).to_path_buf(),
        },
        _ => MoveError::from_io(dest, err),
    }
}

/// Copy file contents with buffered I/O and flush them to disk
fn copy_contents(source: &Path, dest: File) -> io::Result<()> {
    let src_file = File::open(source)?;
    let mut reader = BufReader::with_capacity(COPY_BUFFER_SIZE, src_file);
    let mut writer = BufWriter::with_capacity(COPY_BUFFER_SIZE, dest);

    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        writer.write_all(&buffer[..bytes_read])?;
    }

    writer.flush()?;
    writer.get_ref().sync_all()
}

/// Carry permissions and access/modification times over to `dest`
fn copy_metadata(source: &Path, dest: &Path) -> io::Result<()> {
    let metadata = fs::metadata(source)?;
    fs::set_permissions(dest, metadata.permissions())?;
    filetime::set_file_times(
        dest,
        filetime::FileTime::from_last_access_time(&metadata),
        filetime::FileTime::from_last_modification_time(&metadata),
    )
}

/// A vanished source with a present destination counts as verified
fn verify_move(source: &Path, dest: &Path) -> Result<(), MoveError> {
    if !source.exists() && dest.exists() {
        return Ok(());
    }

    match hash::same_content(source, dest) {
        Ok(true) => Ok(()),
        Ok(false) => Err(MoveError::IntegrityMismatch {
            source_path: source.to_path_buf(),
            destination: dest.to_path_buf(),
        }),
        Err(e) => {
            error!(source = %source.display(), destination = %dest.display(), error = %e, "Verification failed");
            Err(MoveError::IntegrityMismatch {
                source_path: source.to_path_buf(),
                destination: dest.to_path_buf(),
            })
        }
    }
}

fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path)
        && e.kind() != io::ErrorKind::NotFound
    {
        warn!(path = %path.display(), error = %e, "Failed to clean up partial file");
    }
}
