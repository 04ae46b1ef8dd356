//! Validation of category names and root directories
//!
//! Both checks run before anything on disk is mutated.

use crate::error::{Error, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

static CATEGORY_PATTERN: OnceLock<Regex> = OnceLock::new();

fn category_pattern() -> &'static Regex {
    CATEGORY_PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_-]+$").expect("category pattern is a valid regex")
    })
}

#[cfg(unix)]
const FORBIDDEN_PATHS: &[&str] = &[
    "/", "/etc", "/usr", "/bin", "/sbin", "/boot", "/sys", "/proc", "/dev", "/var", "/tmp",
    "/System",
];

#[cfg(windows)]
const FORBIDDEN_PATHS: &[&str] = &[
    "C:\\",
    "C:\\Windows",
    "C:\\Program Files",
    "C:\\Program Files (x86)",
    "C:\\ProgramData",
    "C:\\Users\\Default",
    "C:\\Users\\Public",
];

/// Check that a category name is safe to use as a single directory component
pub fn validate_category_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidCategory {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.starts_with(['/', '\\', '~']) {
        return Err(invalid("category name looks like an absolute path"));
    }

    if name.contains("..") || name.contains('/') || name.contains('\\') {
        return Err(invalid("category names cannot contain path traversal sequences"));
    }

    if !category_pattern().is_match(name) {
        return Err(invalid(
            "must contain only letters, numbers, underscores, and hyphens",
        ));
    }

    Ok(())
}

/// Check that `directory` is safe to organise and return its canonical form
///
/// The directory must exist, be readable and writable, must not be or contain
/// a system directory, and must not be the user's home directory.
pub fn validate_directory(directory: &Path) -> Result<PathBuf> {
    let resolved = fs::canonicalize(directory).map_err(|e| Error::InvalidDirectory {
        path: directory.to_path_buf(),
        reason: format!("directory does not exist or cannot be resolved: {}", e),
    })?;

    let metadata = fs::metadata(&resolved)?;
    if !metadata.is_dir() {
        return Err(Error::InvalidDirectory {
            path: resolved,
            reason: "path is not a directory".into(),
        });
    }

    if metadata.permissions().readonly() || fs::read_dir(&resolved).is_err() {
        return Err(Error::InvalidDirectory {
            path: resolved,
            reason: "insufficient permissions for directory".into(),
        });
    }

    check_forbidden_paths(&resolved)?;

    if let Some(home) = home_dir()
        && fs::canonicalize(&home).unwrap_or(home) == resolved
    {
        return Err(Error::ForbiddenDirectory {
            path: resolved,
            reason: "organising the home directory is not allowed - please choose a subdirectory"
                .into(),
        });
    }

    debug!(directory = %resolved.display(), "Directory validated");
    Ok(resolved)
}

fn check_forbidden_paths(directory: &Path) -> Result<()> {
    for forbidden in FORBIDDEN_PATHS.iter().map(Path::new) {
        if directory == forbidden {
            return Err(Error::ForbiddenDirectory {
                path: directory.to_path_buf(),
                reason: "organising system directories is not allowed".into(),
            });
        }

        if forbidden.starts_with(directory) {
            return Err(Error::ForbiddenDirectory {
                path: directory.to_path_buf(),
                reason: format!("directory contains system path {}", forbidden.display()),
            });
        }
    }

    Ok(())
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(windows)]
    let var = "USERPROFILE";
    #[cfg(not(windows))]
    let var = "HOME";

    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
