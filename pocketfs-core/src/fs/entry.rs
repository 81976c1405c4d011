use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::fs::classify::{EntryKind, classify};

/// One listed filesystem or media object.
///
/// Built fresh by every listing. Directories never carry a size, and `kind`
/// is computed at construction so it can never go stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    name: CompactString,
    path: PathBuf,
    is_dir: bool,
    size: Option<u64>,
    modified: Option<DateTime<Utc>>,
    kind: EntryKind,
}

// ------------------------------------------------------------
// Construction
// ------------------------------------------------------------
impl Entry {
    #[must_use]
    pub fn directory(
        name: impl Into<CompactString>,
        path: impl Into<PathBuf>,
        modified: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            is_dir: true,
            size: None,
            modified,
            kind: EntryKind::Folder,
        }
    }

    #[must_use]
    pub fn file(
        name: impl Into<CompactString>,
        path: impl Into<PathBuf>,
        size: Option<u64>,
        modified: Option<DateTime<Utc>>,
    ) -> Self {
        let name: CompactString = name.into();
        let kind: EntryKind = classify(&name, false);

        Self {
            name,
            path: path.into(),
            is_dir: false,
            size,
            modified,
            kind,
        }
    }

    /// A media-index asset. The index has already classified it, so the
    /// name-based classifier is skipped.
    #[must_use]
    pub fn media(
        name: impl Into<CompactString>,
        path: impl Into<PathBuf>,
        kind: EntryKind,
        modified: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            is_dir: false,
            size: None,
            modified,
            kind,
        }
    }
}

// ------------------------------------------------------------
// Accessors
// ------------------------------------------------------------
impl Entry {
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        self.is_dir
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> Option<u64> {
        self.size
    }

    #[inline]
    #[must_use]
    pub const fn modified(&self) -> Option<DateTime<Utc>> {
        self.modified
    }

    #[inline]
    #[must_use]
    pub const fn kind(&self) -> EntryKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_has_no_size() {
        let dir = Entry::directory("photos.2024", "/r/photos.2024", None);
        assert!(dir.is_dir());
        assert_eq!(dir.size(), None);
        assert_eq!(dir.kind(), EntryKind::Folder);
    }

    #[test]
    fn test_file_kind_is_derived_from_name() {
        let file = Entry::file("song.MP3", "/r/song.MP3", Some(42), None);
        assert!(!file.is_dir());
        assert_eq!(file.size(), Some(42));
        assert_eq!(file.kind(), EntryKind::Audio);
    }

    #[test]
    fn test_media_kind_overrides_classifier() {
        let asset = Entry::media("IMG_0001", "/m/IMG_0001", EntryKind::Image, None);
        assert_eq!(asset.kind(), EntryKind::Image);
        assert_eq!(asset.size(), None);
    }
}
