//! File-backed key-value persistence with atomic writes
//!
//! Every key maps to one JSON document `<dir>/<key>.json`. Reads return the
//! whole document, writes replace it wholesale through a temporary file and a
//! rename, so a crash mid-write never leaves a truncated blob behind.

use crate::{PrefError, PrefResult};
use compact_str::CompactString;
use directories::ProjectDirs;
use serde::{Serialize, de::DeserializeOwned};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::{debug, warn};

pub(crate) const SETTINGS_KEY: &str = "settings";
pub(crate) const RECENT_FILES_KEY: &str = "recent_files";
pub(crate) const FAVORITES_KEY: &str = "favorites";

/// Distinguishes temp files of overlapping saves to the same key
static TEMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Directory of JSON preference blobs
#[derive(Debug, Clone)]
pub struct PrefStore {
    dir: PathBuf,
}

impl PrefStore {
    /// Store rooted at `dir`; the directory is created lazily on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under the platform data directory (`.../PocketFS/prefs`).
    pub fn with_default_location() -> PrefResult<Self> {
        let proj_dirs = ProjectDirs::from("org", "pocketfs", "PocketFS").ok_or_else(|| {
            PrefError::StoreUnavailable(CompactString::const_new("no home directory"))
        })?;

        Ok(Self::new(proj_dirs.data_dir().join("prefs")))
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Read a whole blob. Missing and corrupt blobs yield `T::default()`.
    pub(crate) async fn read_blob<T>(&self, key: &'static str) -> PrefResult<T>
    where
        T: DeserializeOwned + Default,
    {
        let path = self.blob_path(key);

        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(key, "Preference blob missing, using defaults");
                return Ok(T::default());
            }
            Err(e) => return Err(PrefError::read(&path, &e)),
        };

        match serde_json::from_slice(&data) {
            Ok(value) => Ok(value),
            Err(e) => {
                let err = PrefError::Corrupted {
                    key,
                    message: CompactString::from(e.to_string()),
                };
                warn!(key, error = %err, "Discarding corrupted preference blob");
                Ok(T::default())
            }
        }
    }

    /// Replace a whole blob atomically.
    pub(crate) async fn write_blob<T>(&self, key: &'static str, value: &T) -> PrefResult<()>
    where
        T: Serialize + ?Sized,
    {
        let data = serde_json::to_vec_pretty(value).map_err(|e| PrefError::Encode {
            key,
            message: CompactString::from(e.to_string()),
        })?;

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| PrefError::atomic_save(&self.dir, &e))?;

        let path = self.blob_path(key);
        let seq = TEMP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let temp_path = self.dir.join(format!("{key}.json.{seq}.tmp"));

        fs::write(&temp_path, &data)
            .await
            .map_err(|e| PrefError::atomic_save(&temp_path, &e))?;

        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(PrefError::atomic_save(&path, &e));
        }

        debug!(key, bytes = data.len(), "Saved preference blob");
        Ok(())
    }

    /// Delete a blob; deleting a missing blob is not an error.
    pub(crate) async fn remove_blob(&self, key: &'static str) -> PrefResult<()> {
        let path = self.blob_path(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PrefError::atomic_save(&path, &e)),
        }
    }
}
