//! Semantic file-type tags derived from a name and a directory flag.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Folder,
    Text,
    Image,
    Document,
    Video,
    Audio,
    Archive,
    Code,
    Unknown,
}

impl EntryKind {
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::Text => "text",
            Self::Image => "image",
            Self::Document => "document",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Archive => "archive",
            Self::Code => "code",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const EXTENSION_TABLE: &[(EntryKind, &[&str])] = &[
    (EntryKind::Text, &["txt", "md", "log", "json", "xml", "csv"]),
    (
        EntryKind::Image,
        &["jpg", "jpeg", "png", "gif", "bmp", "webp", "svg"],
    ),
    (
        EntryKind::Document,
        &["pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx"],
    ),
    (EntryKind::Video, &["mp4", "avi", "mkv", "mov", "wmv"]),
    (EntryKind::Audio, &["mp3", "wav", "flac", "aac", "ogg"]),
    (EntryKind::Archive, &["zip", "rar", "7z", "tar", "gz"]),
    (
        EntryKind::Code,
        &["js", "jsx", "ts", "tsx", "py", "java", "cpp", "c", "html", "css"],
    ),
];

const TEXT_VIEWABLE: &[&str] = &[
    "txt", "md", "log", "json", "xml", "csv", "html", "css", "js", "jsx", "ts", "tsx",
];

const IMAGE_VIEWABLE: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Lower-cased text after the last `.`; empty when the name has none.
#[must_use]
pub fn extension(name: &str) -> String {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

#[must_use]
pub fn classify(name: &str, is_dir: bool) -> EntryKind {
    if is_dir {
        return EntryKind::Folder;
    }

    let ext = extension(name);
    if ext.is_empty() {
        return EntryKind::Unknown;
    }

    EXTENSION_TABLE
        .iter()
        .find(|(_, exts)| exts.contains(&ext.as_str()))
        .map_or(EntryKind::Unknown, |(kind, _)| *kind)
}

/// Files the text viewer can open.
#[must_use]
pub fn is_text_file(name: &str) -> bool {
    TEXT_VIEWABLE.contains(&extension(name).as_str())
}

/// Files the image viewer can open.
#[must_use]
pub fn is_image_file(name: &str) -> bool {
    IMAGE_VIEWABLE.contains(&extension(name).as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_ignores_extension_case() {
        assert_eq!(classify("a.JPG", false), EntryKind::Image);
        assert_eq!(classify("a.jpg", false), EntryKind::Image);
        assert_eq!(classify("Report.Final.PDF", false), EntryKind::Document);
    }

    #[test]
    fn test_directories_are_always_folders() {
        assert_eq!(classify("photos.zip", true), EntryKind::Folder);
        assert_eq!(classify("noext", true), EntryKind::Folder);
    }

    #[test]
    fn test_unknown_and_missing_extensions() {
        assert_eq!(classify("noext", false), EntryKind::Unknown);
        assert_eq!(classify("archive.xyz", false), EntryKind::Unknown);
        assert_eq!(classify("trailing.", false), EntryKind::Unknown);
        assert_eq!(extension("noext"), "");
    }

    #[test]
    fn test_every_category_is_reachable() {
        assert_eq!(classify("notes.md", false), EntryKind::Text);
        assert_eq!(classify("clip.mkv", false), EntryKind::Video);
        assert_eq!(classify("song.flac", false), EntryKind::Audio);
        assert_eq!(classify("backup.7z", false), EntryKind::Archive);
        assert_eq!(classify("main.cpp", false), EntryKind::Code);
    }

    #[test]
    fn test_viewer_helpers() {
        assert!(is_text_file("index.HTML"));
        assert!(is_text_file("data.csv"));
        assert!(!is_text_file("main.py"));
        assert!(is_image_file("cat.webp"));
        assert!(!is_image_file("logo.svg"));
    }
}
