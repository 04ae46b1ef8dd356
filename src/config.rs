//! Configuration types for the file organiser

use crate::categoriser::{CategoryMeta, DEFAULT_FALLBACK};
use crate::mover::{DEFAULT_MAX_FILENAME_BYTES, DEFAULT_MAX_NAME_ATTEMPTS, MoveOptions};
use crate::plugin::FilenameRule;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Built-in extension → category table
#[rustfmt::skip]
const DEFAULT_EXTENSIONS: &[(&str, &str)] = &[
    // archives
    (".zip", "archives"), (".rar", "archives"), (".7z", "archives"), (".tar", "archives"),
    (".gz", "archives"), (".bz2", "archives"), (".xz", "archives"), (".tgz", "archives"),
    (".tar.gz", "archives"), (".tar.bz2", "archives"), (".tar.xz", "archives"),
    // audio
    (".mp3", "audio"), (".wav", "audio"), (".flac", "audio"), (".aac", "audio"),
    (".ogg", "audio"), (".m4a", "audio"), (".wma", "audio"), (".opus", "audio"),
    // code
    (".py", "code"), (".rs", "code"), (".js", "code"), (".ts", "code"), (".java", "code"),
    (".c", "code"), (".cpp", "code"), (".h", "code"), (".go", "code"), (".rb", "code"),
    (".sh", "code"), (".php", "code"), (".swift", "code"), (".kt", "code"),
    // data
    (".csv", "data_files"), (".json", "data_files"), (".xml", "data_files"),
    (".yaml", "data_files"), (".yml", "data_files"), (".sql", "data_files"),
    (".db", "data_files"), (".sqlite", "data_files"), (".parquet", "data_files"),
    // design
    (".psd", "design_files"), (".ai", "design_files"), (".sketch", "design_files"),
    (".fig", "design_files"), (".xd", "design_files"), (".indd", "design_files"),
    // disk images
    (".iso", "disks_images"), (".img", "disks_images"), (".dmg", "disks_images"),
    (".vhd", "disks_images"), (".vmdk", "disks_images"),
    // documents
    (".pdf", "documents"), (".doc", "documents"), (".docx", "documents"),
    (".xls", "documents"), (".xlsx", "documents"), (".ppt", "documents"),
    (".pptx", "documents"), (".odt", "documents"), (".ods", "documents"),
    (".odp", "documents"), (".rtf", "documents"), (".txt", "documents"),
    // ebooks
    (".epub", "ebooks"), (".mobi", "ebooks"), (".azw", "ebooks"), (".azw3", "ebooks"),
    (".fb2", "ebooks"),
    // fonts
    (".ttf", "fonts"), (".otf", "fonts"), (".woff", "fonts"), (".woff2", "fonts"),
    // images
    (".jpg", "images"), (".jpeg", "images"), (".png", "images"), (".gif", "images"),
    (".bmp", "images"), (".webp", "images"), (".tiff", "images"), (".tif", "images"),
    (".svg", "images"), (".heic", "images"), (".heif", "images"), (".avif", "images"),
    (".ico", "images"),
    // installers
    (".exe", "installers"), (".msi", "installers"), (".deb", "installers"),
    (".rpm", "installers"), (".pkg", "installers"), (".apk", "installers"),
    (".appimage", "installers"),
    // raw photos
    (".raw", "raw_images"), (".arw", "raw_images"), (".cr2", "raw_images"),
    (".cr3", "raw_images"), (".nef", "raw_images"), (".orf", "raw_images"),
    (".rw2", "raw_images"), (".dng", "raw_images"), (".raf", "raw_images"),
    // text
    (".md", "text"), (".log", "text"), (".ini", "text"), (".cfg", "text"),
    (".toml", "text"), (".rst", "text"),
    // videos
    (".mp4", "videos"), (".mov", "videos"), (".avi", "videos"), (".mkv", "videos"),
    (".wmv", "videos"), (".flv", "videos"), (".m4v", "videos"), (".webm", "videos"),
    (".3gp", "videos"),
    // web
    (".html", "web"), (".htm", "web"), (".css", "web"), (".scss", "web"),
    // 3d
    (".obj", "3d_files"), (".fbx", "3d_files"), (".stl", "3d_files"), (".blend", "3d_files"),
    (".3ds", "3d_files"), (".gltf", "3d_files"), (".glb", "3d_files"),
];

/// The built-in extension table as an owned map
pub fn default_extensions() -> BTreeMap<String, String> {
    DEFAULT_EXTENSIONS
        .iter()
        .map(|(ext, category)| (ext.to_string(), category.to_string()))
        .collect()
}

/// Configuration for an organisation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory to organise in place
    pub directory: PathBuf,

    /// Include dotfiles and descend into hidden directories
    ///
    /// When off, a hidden directory is skipped as a whole, so files inside
    /// it are left alone even if their own names are not hidden.
    pub include_hidden: bool,

    /// Glob patterns matched against root-relative paths; matches are ignored
    pub exclude_patterns: Vec<String>,

    /// Dry run mode - report what would happen without touching the disk
    pub dry_run: bool,

    /// Keep collision state between runs of the same organiser
    pub reuse_collision_cache: bool,

    /// Compare content hashes after each move
    pub verify: bool,

    /// Prefer atomic rename with a temporary-file fallback across filesystems
    pub atomic: bool,

    /// Keep permissions and timestamps when a file has to be copied
    pub preserve_metadata: bool,

    /// Create category directories as needed
    pub create_dirs: bool,

    /// Refuse system and home directories as the root
    pub validate_paths: bool,

    /// Highest numeric suffix tried when resolving a name collision
    pub max_name_attempts: usize,

    /// Longest filename, in bytes, that will be generated
    pub max_filename_bytes: usize,

    /// Category for files no classifier recognises
    pub fallback_category: String,

    /// Extension → category table used by the extension classifier
    pub extensions: BTreeMap<String, String>,

    /// Built-in classifiers to disable, by name
    pub disabled_plugins: Vec<String>,

    /// Filename glob rules, evaluated before the built-in classifiers
    pub rules: Vec<FilenameRule>,

    /// Display metadata overrides for categories
    pub categories: Vec<CategoryMeta>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            include_hidden: false,
            exclude_patterns: vec![],
            dry_run: false,
            reuse_collision_cache: true,
            verify: true,
            atomic: true,
            preserve_metadata: true,
            create_dirs: true,
            validate_paths: true,
            max_name_attempts: DEFAULT_MAX_NAME_ATTEMPTS,
            max_filename_bytes: DEFAULT_MAX_FILENAME_BYTES,
            fallback_category: DEFAULT_FALLBACK.to_string(),
            extensions: default_extensions(),
            disabled_plugins: vec![],
            rules: vec![],
            categories: vec![],
        }
    }
}

impl Config {
    /// Config for organising `directory` with every other setting at its default
    pub fn for_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }

    /// Mover settings derived from this config
    pub fn move_options(&self) -> MoveOptions {
        MoveOptions {
            atomic: self.atomic,
            verify: self.verify,
            preserve_metadata: self.preserve_metadata,
            create_dirs: self.create_dirs,
            max_name_attempts: self.max_name_attempts,
            max_filename_bytes: self.max_filename_bytes,
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            source: e,
        })?;

        fs::write(path, content).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    /// Generate a sample configuration file content
    pub fn sample_config() -> String {
        r#"# File Organiser Configuration File
# This file uses TOML format (https://toml.io)

# Directory to organise in place
directory = "/home/me/Downloads"

# Include dotfiles and hidden directories
include_hidden = false

# Glob patterns matched against paths relative to the directory
# Matching files are left where they are
exclude_patterns = [
    "*.part",
    "keep/*",
]

# Dry run mode - show what would be done without actually doing it
dry_run = false

# Compare content hashes of source and destination after each move
verify = true

# Use atomic rename, with a copy + rename fallback across filesystems
atomic = true

# Keep permissions and timestamps when a file must be copied
preserve_metadata = true

# Refuse to organise system directories or the home directory itself
validate_paths = true

# Category for files no classifier recognises
fallback_category = "Uncategorised"

# Built-in classifiers to switch off:
# "extension_categoriser", "magic_categoriser", "mime_categoriser"
disabled_plugins = []

# Filename rules, checked before the built-in classifiers
# Patterns are case-insensitive globs matched against the file name
[[rules]]
pattern = "invoice_*.pdf"
category = "invoices"

[[rules]]
pattern = "*.log"
category = "logs"
priority = 1

# Display metadata for custom categories
[[categories]]
name = "invoices"
display_name = "Invoices"
description = "Bills and receipts"
icon = "🧾"

# Extension overrides (replaces the built-in table when present)
# [extensions]
# ".pdf" = "documents"
# ".jpg" = "images"
"#
        .to_string()
    }
}

/// Errors that can occur when loading or saving configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read configuration file
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse configuration file
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// Failed to write configuration file
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to serialize configuration
    SerializeError {
        source: toml::ser::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError { path, source } => {
                write!(f, "Failed to read config file '{}': {}", path.display(), source)
            }
            ConfigError::ParseError { path, source } => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), source)
            }
            ConfigError::WriteError { path, source } => {
                write!(f, "Failed to write config file '{}': {}", path.display(), source)
            }
            ConfigError::SerializeError { source } => {
                write!(f, "Failed to serialize config: {}", source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
            ConfigError::WriteError { source, .. } => Some(source),
            ConfigError::SerializeError { source } => Some(source),
        }
    }
}
