//! Classification plugins
//!
//! A plugin maps a [`FileDescriptor`] to a category name or declines. The
//! [`PluginRegistry`] keeps plugins ordered by ascending priority and the
//! [`Categoriser`](crate::categoriser::Categoriser) consults them in that order.
//!
//! Built-in plugins:
//! - [`ExtensionPlugin`]: extension table lookup (priority 10)
//! - [`MagicPlugin`]: magic-number signatures (priority 20)
//! - [`MimePlugin`]: MIME major type guessed from the path (priority 30)
//! - [`RulePlugin`]: glob filename rules from configuration
//!
//! File filters and post-processors live in [`hooks`].

pub mod extension;
pub mod hooks;
pub mod magic;
pub mod mime;
pub mod registry;
pub mod rules;

use crate::model::FileDescriptor;
use serde::Serialize;
use std::collections::BTreeSet;

pub use extension::ExtensionPlugin;
pub use hooks::{FileFilter, Hooks, PostProcessor};
pub use magic::MagicPlugin;
pub use mime::MimePlugin;
pub use registry::PluginRegistry;
pub use rules::{FilenameRule, RulePlugin};

/// Priority given to plugins that do not choose one
pub const DEFAULT_PRIORITY: i32 = 50;

/// A pluggable classifier
///
/// Lower priorities are consulted first. `can_handle` is a cheap pre-check;
/// when it returns false `classify` is not called for that file.
pub trait ClassifierPlugin: Send + Sync {
    /// Unique plugin name; registering a second plugin with the same name replaces the first
    fn name(&self) -> &str;

    fn version(&self) -> &str {
        "0.1.0"
    }

    fn description(&self) -> &str {
        ""
    }

    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    /// Initial enabled state when registered
    fn enabled(&self) -> bool {
        true
    }

    fn can_handle(&self, _file: &FileDescriptor) -> bool {
        true
    }

    /// Produce a category for `file`, or `None` to decline
    fn classify(&self, file: &FileDescriptor) -> anyhow::Result<Option<String>>;

    /// Every category this plugin can produce
    fn declared_categories(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }
}

/// Listing entry describing a registered plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub priority: i32,
    pub enabled: bool,
}
