//! Categorisation by MIME major type

use super::ClassifierPlugin;
use crate::model::FileDescriptor;
use std::collections::{BTreeSet, HashMap};

const DEFAULT_MAPPING: &[(&str, &str)] = &[
    ("text", "text"),
    ("image", "images"),
    ("audio", "audio"),
    ("video", "videos"),
    ("application", "documents"),
    ("font", "fonts"),
];

/// Guesses a MIME type from the path and maps its major type to a category
#[derive(Debug, Clone)]
pub struct MimePlugin {
    mapping: HashMap<String, String>,
}

impl Default for MimePlugin {
    fn default() -> Self {
        Self::new(DEFAULT_MAPPING.iter().copied())
    }
}

impl MimePlugin {
    pub fn new<K: Into<String>, V: Into<String>>(mapping: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            mapping: mapping
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl ClassifierPlugin for MimePlugin {
    fn name(&self) -> &str {
        "mime_categoriser"
    }

    fn description(&self) -> &str {
        "Categorises files by MIME type"
    }

    fn priority(&self) -> i32 {
        30
    }

    fn classify(&self, file: &FileDescriptor) -> anyhow::Result<Option<String>> {
        let Some(mime) = mime_guess::from_path(&file.path).first() else {
            return Ok(None);
        };
        Ok(self.mapping.get(mime.type_().as_str()).cloned())
    }

    fn declared_categories(&self) -> BTreeSet<String> {
        self.mapping.values().cloned().collect()
    }
}
