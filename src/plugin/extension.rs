//! Categorisation by file extension

use super::ClassifierPlugin;
use crate::model::FileDescriptor;
use std::collections::{BTreeSet, HashMap};

/// Compound suffixes checked against the whole name before the plain extension
const MULTI_PART: &[&str] = &[".tar.gz", ".tar.bz2", ".tar.xz"];

/// Looks the file's extension up in an extension → category table
#[derive(Debug, Clone)]
pub struct ExtensionPlugin {
    extensions: HashMap<String, String>,
}

impl ExtensionPlugin {
    /// Build from a table whose keys may be given with or without the leading dot
    pub fn new<I, K, V>(table: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let extensions = table
            .into_iter()
            .map(|(ext, category)| (normalize(ext.as_ref()), category.into()))
            .collect();
        Self { extensions }
    }

    fn multi_part_match(&self, file: &FileDescriptor) -> Option<&String> {
        let name = file.name.to_lowercase();
        MULTI_PART
            .iter()
            .find(|suffix| name.ends_with(*suffix))
            .and_then(|suffix| self.extensions.get(*suffix))
    }
}

fn normalize(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

impl ClassifierPlugin for ExtensionPlugin {
    fn name(&self) -> &str {
        "extension_categoriser"
    }

    fn description(&self) -> &str {
        "Categorises files by file extension"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn can_handle(&self, file: &FileDescriptor) -> bool {
        self.extensions.contains_key(&file.extension) || self.multi_part_match(file).is_some()
    }

    fn classify(&self, file: &FileDescriptor) -> anyhow::Result<Option<String>> {
        if let Some(category) = self.multi_part_match(file) {
            return Ok(Some(category.clone()));
        }
        Ok(self.extensions.get(&file.extension).cloned())
    }

    fn declared_categories(&self) -> BTreeSet<String> {
        self.extensions.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::path::PathBuf;

    fn fd(name: &str) -> FileDescriptor {
        FileDescriptor::new(PathBuf::from("/data").join(name), 1, Utc::now())
    }

    fn plugin() -> ExtensionPlugin {
        ExtensionPlugin::new([
            ("txt", "documents"),
            (".JPG", "images"),
            (".gz", "compressed"),
            (".tar.gz", "archives"),
        ])
    }

    #[test]
    fn test_classify_by_extension() {
        let plugin = plugin();
        assert_eq!(plugin.classify(&fd("a.txt")).unwrap().as_deref(), Some("documents"));
        assert_eq!(plugin.classify(&fd("B.JpG")).unwrap().as_deref(), Some("images"));
        assert_eq!(plugin.classify(&fd("c.rs")).unwrap(), None);
    }

    #[test]
    fn test_multi_part_suffix_wins() {
        let plugin = plugin();
        assert_eq!(
            plugin.classify(&fd("backup.tar.gz")).unwrap().as_deref(),
            Some("archives")
        );
        assert_eq!(plugin.classify(&fd("log.gz")).unwrap().as_deref(), Some("compressed"));
    }

    #[test]
    fn test_can_handle_is_table_lookup() {
        let plugin = plugin();
        assert!(plugin.can_handle(&fd("a.txt")));
        assert!(!plugin.can_handle(&fd("Makefile")));
    }

    #[test]
    fn test_declared_categories() {
        let categories = plugin().declared_categories();
        assert_eq!(categories.len(), 4);
        assert!(categories.contains("images"));
    }
}
