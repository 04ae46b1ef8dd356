//! Categorisation by magic number (file header signature)
//!
//! Content sniffing is done by the `infer` crate. A small override table runs
//! first for formats whose `infer` family does not match the category they are
//! sorted into, such as PDF which `infer` files under archives.

use super::ClassifierPlugin;
use crate::model::FileDescriptor;
use infer::MatcherType;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use tracing::trace;

/// Number of header bytes inspected; enough for `infer`'s offset-based matchers
const HEADER_LEN: usize = 8192;

const DEFAULT_OVERRIDES: &[(&[u8], &str)] = &[
    (b"%PDF", "documents"),
    (b"%!PS", "documents"),
    (b"{\\rtf", "documents"),
];

/// Category for each `infer` matcher family
const FAMILY_CATEGORIES: &[(MatcherType, &str)] = &[
    (MatcherType::App, "installers"),
    (MatcherType::Archive, "archives"),
    (MatcherType::Audio, "audio"),
    (MatcherType::Book, "ebooks"),
    (MatcherType::Doc, "documents"),
    (MatcherType::Font, "fonts"),
    (MatcherType::Image, "images"),
    (MatcherType::Text, "text"),
    (MatcherType::Video, "videos"),
];

/// Detects file types from their leading bytes
#[derive(Debug, Clone)]
pub struct MagicPlugin {
    overrides: Vec<(Vec<u8>, String)>,
}

impl Default for MagicPlugin {
    fn default() -> Self {
        Self::new(
            DEFAULT_OVERRIDES
                .iter()
                .map(|(sig, cat)| (sig.to_vec(), cat.to_string())),
        )
    }
}

impl MagicPlugin {
    /// Build with extra prefix signatures that win over content sniffing;
    /// earlier signatures take precedence
    pub fn new(overrides: impl IntoIterator<Item = (Vec<u8>, String)>) -> Self {
        Self {
            overrides: overrides.into_iter().collect(),
        }
    }

    fn match_header(&self, header: &[u8]) -> Option<&str> {
        if let Some((_, category)) = self.overrides.iter().find(|(sig, _)| header.starts_with(sig)) {
            return Some(category.as_str());
        }

        let kind = infer::get(header)?;
        trace!(mime = kind.mime_type(), extension = kind.extension(), "Sniffed content type");
        family_category(kind.matcher_type())
    }
}

fn family_category(family: MatcherType) -> Option<&'static str> {
    FAMILY_CATEGORIES
        .iter()
        .find(|(f, _)| *f == family)
        .map(|(_, category)| *category)
}

impl ClassifierPlugin for MagicPlugin {
    fn name(&self) -> &str {
        "magic_categoriser"
    }

    fn description(&self) -> &str {
        "Categorises files by magic numbers (file headers)"
    }

    fn priority(&self) -> i32 {
        20
    }

    fn can_handle(&self, file: &FileDescriptor) -> bool {
        file.size > 0
    }

    fn classify(&self, file: &FileDescriptor) -> anyhow::Result<Option<String>> {
        // Unreadable files simply do not match
        let Ok(handle) = File::open(&file.path) else {
            return Ok(None);
        };
        let mut header = Vec::with_capacity(HEADER_LEN);
        if handle.take(HEADER_LEN as u64).read_to_end(&mut header).is_err() {
            return Ok(None);
        }

        let category = self.match_header(&header);
        trace!(path = ?file.path, ?category, "Checked magic number");
        Ok(category.map(String::from))
    }

    fn declared_categories(&self) -> BTreeSet<String> {
        self.overrides
            .iter()
            .map(|(_, c)| c.clone())
            .chain(FAMILY_CATEGORIES.iter().map(|(_, c)| c.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_detects_png_without_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("picture");
        fs::write(&path, b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDRrest-of-file").unwrap();

        let fd = FileDescriptor::from_path(&path).unwrap();
        let plugin = MagicPlugin::default();
        assert!(plugin.can_handle(&fd));
        assert_eq!(plugin.classify(&fd).unwrap().as_deref(), Some("images"));
    }

    #[test]
    fn test_pdf_and_archives() {
        let plugin = MagicPlugin::default();
        assert_eq!(plugin.match_header(b"%PDF-1.7\n"), Some("documents"));
        assert_eq!(plugin.match_header(b"PK\x03\x04\x14\x00\x00\x00"), Some("archives"));
        assert_eq!(plugin.match_header(b"\x1f\x8b\x08\x00\x00\x00\x00\x00"), Some("archives"));
        assert_eq!(plugin.match_header(b"plain text"), None);
    }

    #[test]
    fn test_formats_beyond_the_override_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("track");
        let mut mp3 = b"ID3\x03\x00\x00\x00\x00\x00\x00".to_vec();
        mp3.extend_from_slice(&[0u8; 64]);
        fs::write(&path, &mp3).unwrap();

        let fd = FileDescriptor::from_path(&path).unwrap();
        assert_eq!(MagicPlugin::default().classify(&fd).unwrap().as_deref(), Some("audio"));
    }

    #[test]
    fn test_custom_override_wins() {
        let plugin = MagicPlugin::new([(b"\x89PNG".to_vec(), "screenshots".to_string())]);
        assert_eq!(plugin.match_header(b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR"), Some("screenshots"));
        assert!(plugin.declared_categories().contains("screenshots"));
    }

    #[test]
    fn test_empty_and_missing_files() {
        let dir = tempdir().unwrap();
        let empty = dir.path().join("empty");
        fs::write(&empty, b"").unwrap();
        let fd = FileDescriptor::from_path(&empty).unwrap();
        let plugin = MagicPlugin::default();
        assert!(!plugin.can_handle(&fd));

        let mut gone = fd.clone();
        gone.path = dir.path().join("gone");
        gone.size = 10;
        assert_eq!(plugin.classify(&gone).unwrap(), None);
    }

    #[test]
    fn test_declared_categories() {
        let categories = MagicPlugin::default().declared_categories();
        assert_eq!(
            categories.into_iter().collect::<Vec<_>>(),
            [
                "archives",
                "audio",
                "documents",
                "ebooks",
                "fonts",
                "images",
                "installers",
                "text",
                "videos"
            ]
        );
    }
}
