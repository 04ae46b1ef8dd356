//! Ordered registry of classification plugins

use super::{ClassifierPlugin, PluginInfo};
use std::collections::BTreeSet;
use tracing::{info, warn};

struct Entry {
    plugin: Box<dyn ClassifierPlugin>,
    enabled: bool,
}

/// Plugins sorted by ascending priority
///
/// Sorting is stable and happens only on registration, so plugins with equal
/// priority keep their registration order.
#[derive(Default)]
pub struct PluginRegistry {
    entries: Vec<Entry>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin, replacing any plugin already registered under the same name
    pub fn register(&mut self, plugin: Box<dyn ClassifierPlugin>) {
        let name = plugin.name().to_string();
        if let Some(pos) = self.position(&name) {
            warn!(plugin = %name, "Plugin already registered - replacing");
            self.entries.remove(pos);
        }

        info!(
            plugin = %name,
            version = plugin.version(),
            priority = plugin.priority(),
            "Registered plugin"
        );
        let enabled = plugin.enabled();
        self.entries.push(Entry { plugin, enabled });
        self.entries.sort_by_key(|e| e.plugin.priority());
    }

    /// Remove a plugin by name, returning it if it was registered
    pub fn unregister(&mut self, name: &str) -> Option<Box<dyn ClassifierPlugin>> {
        match self.position(name) {
            Some(pos) => {
                info!(plugin = %name, "Unregistered plugin");
                Some(self.entries.remove(pos).plugin)
            }
            None => {
                warn!(plugin = %name, "Plugin not found in registry");
                None
            }
        }
    }

    /// Enable or disable a plugin; returns false when no such plugin exists
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.position(name) {
            Some(pos) => {
                self.entries[pos].enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn ClassifierPlugin> {
        self.position(name).map(|pos| self.entries[pos].plugin.as_ref())
    }

    /// Enabled plugins in evaluation order
    pub fn enabled_plugins(&self) -> impl Iterator<Item = &dyn ClassifierPlugin> {
        self.entries
            .iter()
            .filter(|e| e.enabled)
            .map(|e| e.plugin.as_ref())
    }

    /// Union of the categories declared by enabled plugins
    pub fn all_categories(&self) -> BTreeSet<String> {
        self.enabled_plugins()
            .flat_map(|p| p.declared_categories())
            .collect()
    }

    /// Describe every registered plugin, in evaluation order
    pub fn list_plugins(&self) -> Vec<PluginInfo> {
        self.entries
            .iter()
            .map(|e| PluginInfo {
                name: e.plugin.name().to_string(),
                version: e.plugin.version().to_string(),
                description: e.plugin.description().to_string(),
                priority: e.plugin.priority(),
                enabled: e.enabled,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.plugin.name() == name)
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| (e.plugin.name(), e.enabled)))
            .finish()
    }
}
