//! The storage backend seam.
//!
//! Backends speak `io::Result`; the manager maps failures onto `NavError`.
//! Directory-vs-file is always passed explicitly, never guessed from a name.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMeta {
    pub is_dir: bool,

    /// `None` for directories
    pub size: Option<u64>,

    pub modified: Option<DateTime<Utc>>,
}

impl EntryMeta {
    #[must_use]
    pub fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        let is_dir = metadata.is_dir();

        Self {
            is_dir,
            size: (!is_dir).then(|| metadata.len()),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        }
    }
}

/// One direct child as reported by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub name: String,
    pub path: PathBuf,
    pub meta: EntryMeta,
}

#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn exists(&self, path: &Path) -> io::Result<bool>;

    async fn stat(&self, path: &Path) -> io::Result<EntryMeta>;

    /// Direct children of `path`, in backend order.
    async fn list(&self, path: &Path) -> io::Result<Vec<RawEntry>>;

    /// Create one directory; the parent must exist.
    async fn create_dir(&self, path: &Path) -> io::Result<()>;

    /// Remove a file, or a directory with everything below it.
    async fn remove(&self, path: &Path, is_dir: bool) -> io::Result<()>;

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Byte-for-byte duplicate; directories are copied recursively.
    async fn copy(&self, from: &Path, to: &Path, is_dir: bool) -> io::Result<()>;
}
