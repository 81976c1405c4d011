//! Listing strategies, one per capability tier.
//!
//! Both produce unsorted [`Entry`] values; ordering is applied by the manager
//! so a sort change never needs a backend round trip.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::access::capability::CapabilityTier;
use crate::backend::media::{MediaLibrary, MediaQuery};
use crate::backend::storage::{RawEntry, StorageBackend};
use crate::error::{NavError, NavResult};
use crate::fs::entry::Entry;

#[async_trait]
pub trait Lister: Send + Sync {
    fn tier(&self) -> CapabilityTier;

    async fn list(&self, path: &Path) -> NavResult<Vec<Entry>>;
}

/// Builds the strategy for `tier`.
#[must_use]
pub fn lister_for(
    tier: CapabilityTier,
    storage: Arc<dyn StorageBackend>,
    media: Arc<dyn MediaLibrary>,
    media_page_size: usize,
) -> Box<dyn Lister> {
    match tier {
        CapabilityTier::FullAccess => Box::new(FullAccessLister::new(storage)),
        CapabilityTier::RestrictedMedia => {
            Box::new(RestrictedMediaLister::new(media, media_page_size))
        }
    }
}

/// Direct children of a directory from the storage backend.
pub struct FullAccessLister {
    storage: Arc<dyn StorageBackend>,
}

impl FullAccessLister {
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    fn to_entry(raw: RawEntry) -> Entry {
        if raw.meta.is_dir {
            Entry::directory(raw.name, raw.path, raw.meta.modified)
        } else {
            Entry::file(raw.name, raw.path, raw.meta.size, raw.meta.modified)
        }
    }
}

#[async_trait]
impl Lister for FullAccessLister {
    fn tier(&self) -> CapabilityTier {
        CapabilityTier::FullAccess
    }

    #[instrument(level = "debug", skip(self), fields(path = %path.display()))]
    async fn list(&self, path: &Path) -> NavResult<Vec<Entry>> {
        let exists = self
            .storage
            .exists(path)
            .await
            .map_err(|e| NavError::from_io("exists", path, e))?;

        if !exists {
            return Err(NavError::not_found(path));
        }

        let raw = self
            .storage
            .list(path)
            .await
            .map_err(|e| NavError::from_io("list", path, e))?;

        debug!(count = raw.len(), "Directory enumerated");
        Ok(raw.into_iter().map(Self::to_entry).collect())
    }
}

/// Flat, capped view of the media index. The requested path only gates
/// access; it does not scope the enumeration.
pub struct RestrictedMediaLister {
    media: Arc<dyn MediaLibrary>,
    page_size: usize,
}

impl RestrictedMediaLister {
    #[must_use]
    pub fn new(media: Arc<dyn MediaLibrary>, page_size: usize) -> Self {
        Self { media, page_size }
    }

    async fn ensure_permission(&self, path: &Path) -> NavResult<()> {
        let granted = self
            .media
            .permission_status()
            .await
            .map_err(|e| NavError::from_io("media_permission", path, e))?;
        if granted {
            return Ok(());
        }

        let granted = self
            .media
            .request_permission()
            .await
            .map_err(|e| NavError::from_io("media_permission", path, e))?;
        if granted {
            return Ok(());
        }

        warn!(marker = "MEDIA_PERMISSION_DENIED", "Media library access declined");
        Err(NavError::permission_denied(path))
    }
}

#[async_trait]
impl Lister for RestrictedMediaLister {
    fn tier(&self) -> CapabilityTier {
        CapabilityTier::RestrictedMedia
    }

    #[instrument(level = "debug", skip(self), fields(path = %path.display(), page_size = self.page_size))]
    async fn list(&self, path: &Path) -> NavResult<Vec<Entry>> {
        self.ensure_permission(path).await?;

        let assets = self
            .media
            .assets(&MediaQuery::all_kinds(self.page_size))
            .await
            .map_err(|e| NavError::from_io("media_assets", path, e))?;

        if assets.is_empty() {
            debug!("Media index returned no assets");
        }

        Ok(assets
            .into_iter()
            .map(|asset| {
                Entry::media(
                    asset.filename,
                    asset.locator,
                    asset.kind.entry_kind(),
                    asset.modified,
                )
            })
            .collect())
    }
}
