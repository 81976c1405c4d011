//! Media index backend used by the restricted capability tier.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, instrument};
use walkdir::WalkDir;

use crate::fs::classify::{EntryKind, extension};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

impl MediaKind {
    #[inline]
    #[must_use]
    pub const fn entry_kind(self) -> EntryKind {
        match self {
            Self::Image => EntryKind::Image,
            Self::Video => EntryKind::Video,
            Self::Audio => EntryKind::Audio,
        }
    }

    /// Kind of a file as the index sees it, from its extension.
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        match extension(name).as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" | "heic" => Some(Self::Image),
            "mp4" | "avi" | "mkv" | "mov" | "wmv" | "3gp" => Some(Self::Video),
            "mp3" | "wav" | "flac" | "aac" | "ogg" | "m4a" => Some(Self::Audio),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    pub filename: String,

    /// Stable locator of the asset; used as the entry path
    pub locator: PathBuf,

    pub kind: MediaKind,

    pub modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaSort {
    /// Newest first
    #[default]
    ModifiedDesc,

    ModifiedAsc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaQuery {
    /// Cap on returned assets
    pub first: usize,

    pub kinds: SmallVec<[MediaKind; 3]>,

    pub sort: MediaSort,
}

impl MediaQuery {
    /// First `first` images, videos and audio files, newest first.
    #[must_use]
    pub fn all_kinds(first: usize) -> Self {
        Self {
            first,
            kinds: smallvec![MediaKind::Image, MediaKind::Video, MediaKind::Audio],
            sort: MediaSort::ModifiedDesc,
        }
    }
}

#[async_trait]
pub trait MediaLibrary: Send + Sync {
    async fn permission_status(&self) -> io::Result<bool>;

    /// Ask for access; `Ok(false)` means the user declined.
    async fn request_permission(&self) -> io::Result<bool>;

    async fn assets(&self, query: &MediaQuery) -> io::Result<Vec<MediaAsset>>;
}

/// Grant state of the media permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaPermission {
    Granted,

    /// Not asked yet; a request grants it
    #[default]
    Undetermined,

    Denied,
}

/// A media index built by walking a directory tree on demand.
#[derive(Debug)]
pub struct IndexedMediaLibrary {
    root: PathBuf,
    permission: Mutex<MediaPermission>,
}

impl IndexedMediaLibrary {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            permission: Mutex::new(MediaPermission::default()),
        }
    }

    #[must_use]
    pub fn with_permission(self, permission: MediaPermission) -> Self {
        Self {
            permission: Mutex::new(permission),
            ..self
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn permission(&self) -> MediaPermission {
        self.permission
            .lock()
            .map_or(MediaPermission::Denied, |guard| *guard)
    }
}

#[async_trait]
impl MediaLibrary for IndexedMediaLibrary {
    async fn permission_status(&self) -> io::Result<bool> {
        Ok(self.permission() == MediaPermission::Granted)
    }

    async fn request_permission(&self) -> io::Result<bool> {
        let mut permission = self
            .permission
            .lock()
            .map_err(|_| io::Error::other("media permission lock poisoned"))?;

        if *permission == MediaPermission::Undetermined {
            *permission = MediaPermission::Granted;
        }
        Ok(*permission == MediaPermission::Granted)
    }

    #[instrument(level = "debug", skip(self), fields(root = %self.root.display(), assets_found))]
    async fn assets(&self, query: &MediaQuery) -> io::Result<Vec<MediaAsset>> {
        if self.permission() != MediaPermission::Granted {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "media library access not granted",
            ));
        }

        let root = self.root.clone();
        let query = query.clone();
        let assets = tokio::task::spawn_blocking(move || scan_media(&root, &query))
            .await
            .map_err(io::Error::other)??;

        tracing::Span::current().record("assets_found", assets.len());
        Ok(assets)
    }
}

fn scan_media(root: &Path, query: &MediaQuery) -> io::Result<Vec<MediaAsset>> {
    let mut assets: Vec<MediaAsset> = Vec::new();

    let mut skipped: usize = 0;

    for entry in WalkDir::new(root).follow_links(false) {
        // Unreadable subtrees are skipped, not fatal
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                skipped += 1;
                debug!(error = %e, "Skipping unreadable media path");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let filename = entry.file_name().to_string_lossy().into_owned();
        let Some(kind) = MediaKind::from_file_name(&filename) else {
            continue;
        };
        if !query.kinds.contains(&kind) {
            continue;
        }

        let modified = entry
            .metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .map(DateTime::<Utc>::from);

        assets.push(MediaAsset {
            filename,
            locator: entry.into_path(),
            kind,
            modified,
        });
    }

    match query.sort {
        MediaSort::ModifiedDesc => assets.sort_by(|a, b| b.modified.cmp(&a.modified)),
        MediaSort::ModifiedAsc => assets.sort_by(|a, b| a.modified.cmp(&b.modified)),
    }
    assets.truncate(query.first);

    debug!(root = %root.display(), count = assets.len(), skipped, "Media index scanned");
    Ok(assets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn touch(path: &Path, age_secs: u64) {
        std::fs::write(path, b"media").unwrap();
        let file = std::fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
            .unwrap();
    }

    #[tokio::test]
    async fn test_assets_are_filtered_sorted_and_capped() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("DCIM")).unwrap();
        touch(&temp_dir.path().join("DCIM").join("old.jpg"), 3_000);
        touch(&temp_dir.path().join("new.mp4"), 10);
        touch(&temp_dir.path().join("mid.mp3"), 500);
        touch(&temp_dir.path().join("report.pdf"), 1);

        let library =
            IndexedMediaLibrary::new(temp_dir.path()).with_permission(MediaPermission::Granted);

        let assets = library.assets(&MediaQuery::all_kinds(100)).await.unwrap();
        let names: Vec<&str> = assets.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, vec!["new.mp4", "mid.mp3", "old.jpg"]);

        let capped = library.assets(&MediaQuery::all_kinds(2)).await.unwrap();
        assert_eq!(capped.len(), 2);

        let oldest_first = MediaQuery {
            kinds: smallvec![MediaKind::Image, MediaKind::Audio],
            sort: MediaSort::ModifiedAsc,
            ..MediaQuery::all_kinds(10)
        };
        let assets = library.assets(&oldest_first).await.unwrap();
        let names: Vec<&str> = assets.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, vec!["old.jpg", "mid.mp3"]);
    }

    #[tokio::test]
    async fn test_permission_flow() {
        let temp_dir = TempDir::new().unwrap();

        let library = IndexedMediaLibrary::new(temp_dir.path());
        assert!(!library.permission_status().await.unwrap());
        let err = library.assets(&MediaQuery::all_kinds(1)).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);

        assert!(library.request_permission().await.unwrap());
        assert!(library.permission_status().await.unwrap());

        let denied =
            IndexedMediaLibrary::new(temp_dir.path()).with_permission(MediaPermission::Denied);
        assert!(!denied.request_permission().await.unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_subtree_does_not_hide_other_media() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("DCIM")).unwrap();
        touch(&temp_dir.path().join("DCIM").join("a.jpg"), 10);

        let locked = temp_dir.path().join("Android");
        std::fs::create_dir_all(locked.join("data")).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        let library =
            IndexedMediaLibrary::new(temp_dir.path()).with_permission(MediaPermission::Granted);
        let result = library.assets(&MediaQuery::all_kinds(100)).await;

        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        let assets = result.unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].filename, "a.jpg");
    }

    #[tokio::test]
    async fn test_missing_media_root_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let library = IndexedMediaLibrary::new(temp_dir.path().join("absent"))
            .with_permission(MediaPermission::Granted);

        let assets = library.assets(&MediaQuery::all_kinds(10)).await.unwrap();
        assert!(assets.is_empty());
    }

    #[test]
    fn test_media_kind_maps_to_entry_kind() {
        assert_eq!(MediaKind::from_file_name("IMG_1.HEIC"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_file_name("notes.txt"), None);
        assert_eq!(MediaKind::Audio.entry_kind(), EntryKind::Audio);
    }
}
