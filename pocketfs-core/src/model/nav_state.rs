use prefstore::ViewMode;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::LastError;
use crate::fs::entry::Entry;
use crate::fs::sort::SortKey;

/// Everything the browser screen is allowed to read.
///
/// Published as a whole through a `watch` channel; observers never see a
/// half-applied update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigationState {
    /// Always inside the configured root
    pub current_location: PathBuf,

    /// Result of the latest successful listing of `current_location`
    pub entries: Vec<Entry>,

    /// True while a listing or mutation is in flight
    pub loading: bool,

    pub last_error: Option<LastError>,

    pub view_mode: ViewMode,

    pub sort: SortKey,
}

impl NavigationState {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, sort: SortKey) -> Self {
        Self {
            current_location: root.into(),
            entries: Vec::new(),
            loading: false,
            last_error: None,
            view_mode: ViewMode::default(),
            sort,
        }
    }

    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name() == name)
    }

    #[must_use]
    pub fn entry_at(&self, path: &Path) -> Option<&Entry> {
        self.entries.iter().find(|e| e.path() == path)
    }
}
