//! Local filesystem backend.
//!
//! Symbolic links are followed both when listing and when copying. The
//! access guard is textual, so a link placed inside the root can surface
//! content that lives outside it. Inside a directory copy, a link to a file
//! is copied as the content it points to.

use async_trait::async_trait;
use std::io;
use std::path::Path;
use tokio::fs as TokioFs;
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use crate::backend::storage::{EntryMeta, RawEntry, StorageBackend};

/// [`StorageBackend`] over the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage {
    show_hidden: bool,
}

impl LocalStorage {
    #[must_use]
    pub const fn new(show_hidden: bool) -> Self {
        Self { show_hidden }
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    async fn exists(&self, path: &Path) -> io::Result<bool> {
        TokioFs::try_exists(path).await
    }

    async fn stat(&self, path: &Path) -> io::Result<EntryMeta> {
        let metadata = TokioFs::metadata(path).await?;
        Ok(EntryMeta::from_metadata(&metadata))
    }

    #[instrument(level = "debug", skip(self), fields(path = %path.display(), entries_found))]
    async fn list(&self, path: &Path) -> io::Result<Vec<RawEntry>> {
        let mut read_dir = TokioFs::read_dir(path).await?;
        let mut entries: Vec<RawEntry> = Vec::new();

        while let Some(entry) = read_dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !self.show_hidden && name.starts_with('.') {
                continue;
            }

            let child = entry.path();

            // Follow symlinks; a dangling link is reported as itself
            let metadata = match TokioFs::metadata(&child).await {
                Ok(metadata) => metadata,
                Err(_) => entry.metadata().await?,
            };

            entries.push(RawEntry {
                name,
                path: child,
                meta: EntryMeta::from_metadata(&metadata),
            });
        }

        tracing::Span::current().record("entries_found", entries.len());
        Ok(entries)
    }

    async fn create_dir(&self, path: &Path) -> io::Result<()> {
        TokioFs::create_dir(path).await
    }

    async fn remove(&self, path: &Path, is_dir: bool) -> io::Result<()> {
        if is_dir {
            TokioFs::remove_dir_all(path).await
        } else {
            TokioFs::remove_file(path).await
        }
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        TokioFs::rename(from, to).await
    }

    async fn copy(&self, from: &Path, to: &Path, is_dir: bool) -> io::Result<()> {
        if !is_dir {
            let bytes = TokioFs::copy(from, to).await?;
            debug!(from = %from.display(), to = %to.display(), bytes, "File copied");
            return Ok(());
        }

        let from = from.to_path_buf();
        let to = to.to_path_buf();
        tokio::task::spawn_blocking(move || copy_tree(&from, &to))
            .await
            .map_err(io::Error::other)?
    }
}

/// Recursively copy the directory `from` to the new path `to`.
///
/// On failure the partially written `to` is removed before the error is
/// returned.
fn copy_tree(from: &Path, to: &Path) -> io::Result<()> {
    let result = copy_tree_entries(from, to);

    if let Err(ref e) = result {
        match std::fs::remove_dir_all(to) {
            Ok(()) => debug!(to = %to.display(), error = %e, "Removed partial directory copy"),
            Err(cleanup) if cleanup.kind() == io::ErrorKind::NotFound => {}
            Err(cleanup) => warn!(
                marker = "PARTIAL_COPY_LEFT",
                to = %to.display(),
                error = %cleanup,
                "Could not remove partial directory copy"
            ),
        }
    }

    result
}

fn copy_tree_entries(from: &Path, to: &Path) -> io::Result<()> {
    let mut files: u64 = 0;

    for entry in WalkDir::new(from).follow_links(false) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry.path().strip_prefix(from).map_err(io::Error::other)?;
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
            files += 1;
        }
    }

    debug!(from = %from.display(), to = %to.display(), files, "Directory copied");
    Ok(())
}
