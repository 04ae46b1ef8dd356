//! File categorisation through an ordered chain of plugins
//!
//! Plugins are consulted in ascending priority order. The first non-empty
//! category wins; a plugin that errors or panics is logged and skipped. When
//! nothing matches, the configured fallback category is returned.

use crate::model::FileDescriptor;
use crate::plugin::{ClassifierPlugin, PluginInfo, PluginRegistry};
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::collections::{BTreeSet, HashMap};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use tracing::{debug, error};

/// Category used when no plugin matches
pub const DEFAULT_FALLBACK: &str = "Uncategorised";

/// Icon shown for categories without registered metadata
pub const DEFAULT_ICON: &str = "📁";

/// Display metadata for a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMeta {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Resolved description of a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryInfo {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub icon: String,
    /// Plugins that declare this category, in evaluation order
    pub provided_by: Vec<String>,
}

/// Registry of category display metadata
#[derive(Debug, Clone, Default)]
pub struct CategoryRegistry {
    entries: HashMap<String, CategoryMeta>,
}

impl CategoryRegistry {
    /// Empty registry - every category resolves to humanised defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with metadata for the standard categories
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (name, display, description, icon) in DEFAULT_CATEGORY_METADATA {
            registry.register(CategoryMeta {
                name: name.to_string(),
                display_name: Some(display.to_string()),
                description: Some(description.to_string()),
                icon: Some(icon.to_string()),
            });
        }
        registry
    }

    pub fn register(&mut self, meta: CategoryMeta) {
        self.entries.insert(meta.name.clone(), meta);
    }

    pub fn display_name(&self, category: &str) -> String {
        self.entries
            .get(category)
            .and_then(|m| m.display_name.clone())
            .unwrap_or_else(|| humanise(category))
    }

    pub fn description(&self, category: &str) -> String {
        self.entries
            .get(category)
            .and_then(|m| m.description.clone())
            .unwrap_or_else(|| format!("Files in the {} category", category))
    }

    pub fn icon(&self, category: &str) -> String {
        self.entries
            .get(category)
            .and_then(|m| m.icon.clone())
            .unwrap_or_else(|| DEFAULT_ICON.to_string())
    }
}

const DEFAULT_CATEGORY_METADATA: &[(&str, &str, &str, &str)] = &[
    ("archives", "Archives", "Compressed archive files", "📦"),
    ("audio", "Audio", "Audio files", "🎵"),
    ("code", "Code", "Source code files", "💻"),
    ("data_files", "Data Files", "Data files such as CSV, JSON, XML", "📊"),
    ("design_files", "Design Files", "Design and graphics files", "🎨"),
    ("disks_images", "Disk Images", "Disk image files", "💿"),
    ("documents", "Documents", "Document files", "📄"),
    ("ebooks", "eBooks", "Electronic book files", "📚"),
    ("fonts", "Fonts", "Font files", "🔤"),
    ("images", "Images", "Image files", "🖼️"),
    ("installers", "Installers", "Software installer files", "🛠️"),
    ("misc", "Miscellaneous", "Miscellaneous files", "🗂️"),
    ("raw_images", "Raw Images", "Raw image files from cameras", "📷"),
    ("text", "Text Files", "Plain text files", "📝"),
    ("videos", "Videos", "Video files", "🎬"),
    ("web", "Web Files", "Web-related files", "🌐"),
    ("3d_files", "3D Files", "3D model and design files", "🧱"),
    ("Uncategorised", "Uncategorised", "Files that could not be categorised", "❓"),
];

/// Underscores become spaces and every word is title-cased
///
/// A letter is upper-cased when it follows a non-letter, so `3d_files`
/// becomes `3D Files`.
pub fn humanise(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_is_letter = false;
    for ch in name.replace('_', " ").chars() {
        if ch.is_alphabetic() {
            if prev_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(ch);
            prev_is_letter = false;
        }
    }
    out
}

/// Overview of the categoriser's configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoriserSummary {
    pub total_plugins: usize,
    pub enabled_plugins: usize,
    pub total_categories: usize,
    pub fallback_category: String,
    pub plugins: Vec<PluginInfo>,
}

/// Resolves files to category names through registered plugins
#[derive(Debug)]
pub struct Categoriser {
    registry: PluginRegistry,
    metadata: CategoryRegistry,
    fallback: String,
    categories: OnceCell<BTreeSet<String>>,
}

impl Default for Categoriser {
    fn default() -> Self {
        Self::new(PluginRegistry::new(), DEFAULT_FALLBACK)
    }
}

impl Categoriser {
    pub fn new(registry: PluginRegistry, fallback: impl Into<String>) -> Self {
        Self {
            registry,
            metadata: CategoryRegistry::with_defaults(),
            fallback: fallback.into(),
            categories: OnceCell::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: CategoryRegistry) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn metadata(&self) -> &CategoryRegistry {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut CategoryRegistry {
        &mut self.metadata
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Register a plugin; the category cache is rebuilt on next use
    pub fn register(&mut self, plugin: Box<dyn ClassifierPlugin>) {
        self.registry.register(plugin);
        self.invalidate();
    }

    pub fn unregister(&mut self, name: &str) -> Option<Box<dyn ClassifierPlugin>> {
        let removed = self.registry.unregister(name);
        self.invalidate();
        removed
    }

    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        let found = self.registry.set_enabled(name, enabled);
        self.invalidate();
        found
    }

    fn invalidate(&mut self) {
        self.categories = OnceCell::new();
        debug!("Categorisation plugin cache invalidated");
    }

    /// Category for one file
    pub fn categorise(&self, file: &FileDescriptor) -> String {
        for plugin in self.registry.enabled_plugins() {
            let attempt = catch_unwind(AssertUnwindSafe(|| {
                if !plugin.can_handle(file) {
                    return Ok(None);
                }
                plugin.classify(file)
            }));

            match attempt {
                Ok(Ok(Some(category))) if !category.is_empty() => {
                    debug!(
                        file = %file.name,
                        category = %category,
                        plugin = plugin.name(),
                        "File categorised"
                    );
                    return category;
                }
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    error!(
                        plugin = plugin.name(),
                        file = %file.name,
                        error = %e,
                        "Plugin failed to categorise file"
                    );
                }
                Err(_) => {
                    error!(
                        plugin = plugin.name(),
                        file = %file.name,
                        "Plugin panicked while categorising file"
                    );
                }
            }
        }

        debug!(
            file = %file.name,
            fallback = %self.fallback,
            "No plugin matched, using fallback category"
        );
        self.fallback.clone()
    }

    /// Categorise each file independently
    pub fn categorise_batch<'a, I>(&self, files: I) -> HashMap<PathBuf, String>
    where
        I: IntoIterator<Item = &'a FileDescriptor>,
    {
        files
            .into_iter()
            .map(|f| (f.path.clone(), self.categorise(f)))
            .collect()
    }

    /// Every category a plugin can produce, plus the fallback
    pub fn all_categories(&self) -> &BTreeSet<String> {
        self.categories.get_or_init(|| {
            let mut categories = self.registry.all_categories();
            categories.insert(self.fallback.clone());
            categories
        })
    }

    pub fn category_info(&self, category: &str) -> CategoryInfo {
        let provided_by = self
            .registry
            .enabled_plugins()
            .filter(|p| p.declared_categories().contains(category))
            .map(|p| p.name().to_string())
            .collect();

        CategoryInfo {
            name: category.to_string(),
            display_name: self.metadata.display_name(category),
            description: self.metadata.description(category),
            icon: self.metadata.icon(category),
            provided_by,
        }
    }

    pub fn summary(&self) -> CategoriserSummary {
        let plugins = self.registry.list_plugins();
        CategoriserSummary {
            total_plugins: plugins.len(),
            enabled_plugins: plugins.iter().filter(|p| p.enabled).count(),
            total_categories: self.all_categories().len(),
            fallback_category: self.fallback.clone(),
            plugins,
        }
    }
}
