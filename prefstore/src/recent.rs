use crate::PrefResult;
use crate::store::{PrefStore, RECENT_FILES_KEY};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Upper bound on remembered recent files
pub const MAX_RECENT_FILES: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentFile {
    pub path: PathBuf,

    pub name: String,

    pub timestamp: DateTime<Utc>,

    /// Classifier tag of the file when it was opened
    #[serde(rename = "type")]
    pub kind: String,
}

impl RecentFile {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            timestamp: Utc::now(),
            kind: kind.into(),
        }
    }
}

impl PrefStore {
    /// Most recent first.
    pub async fn recent_files(&self) -> PrefResult<Vec<RecentFile>> {
        self.read_blob(RECENT_FILES_KEY).await
    }

    /// Move `file` to the front, dropping any older record of the same path.
    pub async fn record_recent(&self, file: RecentFile) -> PrefResult<()> {
        let mut recent = self.recent_files().await?;

        recent.retain(|f| f.path != file.path);
        recent.insert(0, file);
        recent.truncate(MAX_RECENT_FILES);

        self.write_blob(RECENT_FILES_KEY, &recent).await
    }

    pub async fn clear_recent(&self) -> PrefResult<()> {
        self.remove_blob(RECENT_FILES_KEY).await
    }

    pub async fn forget_recent(&self, path: &Path) -> PrefResult<()> {
        let mut recent = self.recent_files().await?;
        let before = recent.len();
        recent.retain(|f| f.path != path);

        if recent.len() == before {
            return Ok(());
        }
        self.write_blob(RECENT_FILES_KEY, &recent).await
    }
}
