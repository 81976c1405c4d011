//! ============================================================================
//! # NavigationManager: sandboxed navigation and file operations
//!
//! Owns the published [`NavigationState`] and is the only writer to it.
//! Every path argument passes the [`AccessGuard`] before a backend is
//! contacted, and every mutation is refused up front in restricted mode.
//!
//! ## Consistency
//! - Each listing is stamped with a generation token; a listing that
//!   completes after a newer one was issued is dropped without touching state
//! - A failed listing clears `entries` and publishes `last_error`
//! - A failed mutation leaves `entries` as they were
//! - A successful mutation triggers a refresh; a refresh failure is published
//!   but the mutation still reports success
//!
//! Read-only backend calls are bounded by `backend_timeout`; mutating calls
//! always run to completion and report their real outcome.
//!
//! Two concurrent mutations are not serialised against each other.
//! ============================================================================

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use prefstore::{PrefStore, SettingsStore, ViewMode};
use tokio::sync::watch;
use tracing::{Span, debug, error, info, instrument, warn};

use crate::access::capability::{CapabilityTier, RuntimeSignals, process_capability_tier};
use crate::access::guard::AccessGuard;
use crate::backend::local::LocalStorage;
use crate::backend::media::{IndexedMediaLibrary, MediaLibrary};
use crate::backend::permissions::{GrantedPermissions, PermissionBroker};
use crate::backend::storage::{EntryMeta, StorageBackend};
use crate::config::{Config, ListingConfig};
use crate::error::{LastError, NavError, NavResult};
use crate::fs::sort::{SortKey, sort_entries};
use crate::model::nav_state::NavigationState;
use crate::operators::listing::{Lister, lister_for};

pub struct NavigationManagerBuilder {
    guard: AccessGuard,
    tier: CapabilityTier,
    storage: Option<Arc<dyn StorageBackend>>,
    media: Option<Arc<dyn MediaLibrary>>,
    permissions: Option<Arc<dyn PermissionBroker>>,
    settings: Option<Arc<dyn SettingsStore>>,
    listing: ListingConfig,
}

impl NavigationManagerBuilder {
    #[must_use]
    pub fn storage(mut self, storage: Arc<dyn StorageBackend>) -> Self {
        self.storage = Some(storage);
        self
    }

    #[must_use]
    pub fn media(mut self, media: Arc<dyn MediaLibrary>) -> Self {
        self.media = Some(media);
        self
    }

    #[must_use]
    pub fn permissions(mut self, permissions: Arc<dyn PermissionBroker>) -> Self {
        self.permissions = Some(permissions);
        self
    }

    #[must_use]
    pub fn settings(mut self, settings: Arc<dyn SettingsStore>) -> Self {
        self.settings = Some(settings);
        self
    }

    #[must_use]
    pub fn listing(mut self, listing: ListingConfig) -> Self {
        self.listing = listing;
        self
    }

    #[must_use]
    pub fn sort(mut self, key: SortKey) -> Self {
        self.listing.default_sort = key;
        self
    }

    #[must_use]
    pub fn backend_timeout(mut self, timeout: Duration) -> Self {
        self.listing.backend_timeout = timeout;
        self
    }

    /// Missing backends default to the local filesystem, a media index over
    /// the root, a grant-everything broker and the default preferences dir.
    pub fn build(self) -> NavResult<Arc<NavigationManager>> {
        let storage: Arc<dyn StorageBackend> = self
            .storage
            .unwrap_or_else(|| Arc::new(LocalStorage::default()));

        let media: Arc<dyn MediaLibrary> = self
            .media
            .unwrap_or_else(|| Arc::new(IndexedMediaLibrary::new(self.guard.root())));

        let permissions: Arc<dyn PermissionBroker> = self
            .permissions
            .unwrap_or_else(|| Arc::new(GrantedPermissions));

        let settings: Arc<dyn SettingsStore> = match self.settings {
            Some(settings) => settings,
            None => Arc::new(PrefStore::with_default_location()?),
        };

        let lister = lister_for(
            self.tier,
            Arc::clone(&storage),
            Arc::clone(&media),
            self.listing.media_page_size,
        );

        let initial = NavigationState::new(self.guard.root(), self.listing.default_sort);
        let (state_tx, _) = watch::channel(initial);

        info!(
            marker = "NAVIGATION_MANAGER_READY",
            operation_type = "startup",
            tier = %self.tier,
            root = %self.guard.root().display(),
            "Navigation manager constructed"
        );

        Ok(Arc::new(NavigationManager {
            tier: self.tier,
            guard: self.guard,
            storage,
            media,
            permissions,
            settings,
            lister,
            backend_timeout: self.listing.backend_timeout,
            state_tx,
            generation: AtomicU64::new(0),
        }))
    }
}

pub struct NavigationManager {
    tier: CapabilityTier,
    guard: AccessGuard,
    storage: Arc<dyn StorageBackend>,
    media: Arc<dyn MediaLibrary>,
    permissions: Arc<dyn PermissionBroker>,
    settings: Arc<dyn SettingsStore>,
    lister: Box<dyn Lister>,
    backend_timeout: Duration,
    state_tx: watch::Sender<NavigationState>,

    /// Token of the most recently issued listing
    generation: AtomicU64,
}

// ------------------------------------------------------------
// Construction and published state
// ------------------------------------------------------------
impl NavigationManager {
    #[must_use]
    pub fn builder(guard: AccessGuard, tier: CapabilityTier) -> NavigationManagerBuilder {
        NavigationManagerBuilder {
            guard,
            tier,
            storage: None,
            media: None,
            permissions: None,
            settings: None,
            listing: ListingConfig::default(),
        }
    }

    /// Wire up a manager for this process from `config`.
    ///
    /// The capability tier is decided here on first use and memoised.
    pub fn from_config(config: &Config) -> anyhow::Result<Arc<Self>> {
        let signals = RuntimeSignals::from_config(&config.runtime).with_env_overrides();
        let tier = process_capability_tier(
            &signals,
            config.storage.platform,
            &config.runtime.host_bundle_markers,
        );

        let policy = config.storage.root_policy()?;
        let guard = policy.guard(tier);

        let manager = Self::builder(guard, tier)
            .storage(Arc::new(LocalStorage::new(config.storage.show_hidden)))
            .media(Arc::new(IndexedMediaLibrary::new(policy.media_root())))
            .settings(Arc::new(PrefStore::with_default_location()?))
            .listing(config.listing.clone())
            .build()?;

        Ok(manager)
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<NavigationState> {
        self.state_tx.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> NavigationState {
        self.state_tx.borrow().clone()
    }

    #[must_use]
    pub fn current_location(&self) -> PathBuf {
        self.state_tx.borrow().current_location.clone()
    }

    #[inline]
    #[must_use]
    pub const fn tier(&self) -> CapabilityTier {
        self.tier
    }

    #[inline]
    #[must_use]
    pub const fn guard(&self) -> &AccessGuard {
        &self.guard
    }
}

// ------------------------------------------------------------
// Navigation
// ------------------------------------------------------------
impl NavigationManager {
    /// Load the persisted view mode, then list the starting location.
    #[instrument(name = "navigation_init", level = "info", skip(self))]
    pub async fn init(&self) -> NavResult<()> {
        match self.settings.get_settings().await {
            Ok(settings) => {
                self.state_tx
                    .send_modify(|s| s.view_mode = settings.view_mode);
            }
            Err(e) => {
                let err = NavError::from(e);
                warn!(error = %err, "Could not load settings, keeping defaults");
            }
        }

        self.refresh().await
    }

    #[instrument(
        name = "navigate_to",
        level = "info",
        skip(self, path),
        fields(path = %path.as_ref().display())
    )]
    pub async fn navigate_to(&self, path: impl AsRef<Path>) -> NavResult<()> {
        let path = path.as_ref();

        if let Err(e) = self.guard.check(path) {
            self.publish_failure(&e);
            return Err(e);
        }

        self.state_tx
            .send_modify(|s| s.current_location = path.to_path_buf());
        self.load(path).await
    }

    #[instrument(name = "navigate_back", level = "info", skip(self))]
    pub async fn navigate_back(&self) -> NavResult<()> {
        let current = self.current_location();

        let parent = match current.parent() {
            Some(parent) if !self.guard.is_root(&current) => parent.to_path_buf(),
            _ => {
                let err = NavError::AlreadyAtRoot {
                    root: self.guard.root().to_string_lossy().as_ref().into(),
                };
                self.publish_failure(&err);
                return Err(err);
            }
        };

        self.navigate_to(parent).await
    }

    /// Re-run the listing at the current location.
    #[instrument(name = "refresh", level = "debug", skip(self))]
    pub async fn refresh(&self) -> NavResult<()> {
        let current = self.current_location();
        self.load(&current).await
    }

    /// Re-order cached entries; no backend round trip.
    pub fn set_sort(&self, key: SortKey) {
        self.state_tx.send_modify(|s| {
            s.sort = key;
            sort_entries(&mut s.entries, key);
        });
        debug!(sort = %key, "Sort key changed");
    }

    /// Publish `mode` and persist it, keeping the other settings.
    #[instrument(name = "set_view_mode", level = "info", skip(self), fields(mode = %mode))]
    pub async fn set_view_mode(&self, mode: ViewMode) -> NavResult<()> {
        self.state_tx.send_modify(|s| s.view_mode = mode);

        let result = async {
            let mut settings = self.settings.get_settings().await?;
            settings.view_mode = mode;
            self.settings.save_settings(settings).await?;
            Ok::<_, NavError>(())
        }
        .await;

        if let Err(ref e) = result {
            error!(error = %e, "Failed to persist view mode");
            self.publish_failure(e);
        }
        result
    }

    /// Ask the platform for the access this tier needs.
    #[instrument(name = "request_permissions", level = "info", skip(self), fields(tier = %self.tier))]
    pub async fn request_permissions(&self) -> NavResult<bool> {
        let root = self.guard.root().to_path_buf();

        let granted = match self.tier {
            CapabilityTier::RestrictedMedia => {
                self.call("media_permission", &root, self.media.request_permission())
                    .await?
            }
            CapabilityTier::FullAccess => {
                self.call("storage_permission", &root, self.permissions.request_storage())
                    .await?
            }
        };

        if !granted {
            warn!(marker = "PERMISSION_DECLINED", "Storage access was not granted");
        }
        Ok(granted)
    }

    /// The listing routine. Only results carrying the latest token are applied.
    async fn load(&self, path: &Path) -> NavResult<()> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        self.state_tx.send_modify(|s| {
            s.loading = true;
            s.last_error = None;
        });

        let result: NavResult<_> = match self.guard.check(path) {
            Ok(()) => {
                self.bounded("list", self.lister.list(path))
                    .await
            }
            Err(e) => Err(e),
        };

        let applied = self.state_tx.send_if_modified(|s| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }

            s.loading = false;
            match &result {
                Ok(entries) => {
                    let mut entries = entries.clone();
                    sort_entries(&mut entries, s.sort);
                    s.entries = entries;
                }
                Err(e) => {
                    s.entries.clear();
                    s.last_error = Some(LastError::from(e));
                }
            }
            true
        });

        match result {
            Ok(entries) if applied => {
                debug!(
                    path = %path.display(),
                    count = entries.len(),
                    tier = %self.lister.tier(),
                    generation,
                    "Listing applied"
                );
                Ok(())
            }
            Ok(_) => {
                debug!(path = %path.display(), generation, "Discarded superseded listing");
                Ok(())
            }
            Err(e) if !applied => {
                debug!(
                    path = %path.display(),
                    error = %e,
                    generation,
                    "Discarded superseded listing failure"
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    path = %path.display(),
                    error = %e,
                    operation_type = e.operation_type(),
                    "Listing failed"
                );
                Err(e)
            }
        }
    }
}

// ------------------------------------------------------------
// Mutations
// ------------------------------------------------------------
impl NavigationManager {
    #[instrument(
        name = "create_folder",
        level = "info",
        skip(self),
        fields(operation_id = tracing::field::Empty)
    )]
    pub async fn create_folder(&self, name: &str) -> NavResult<PathBuf> {
        self.begin_mutation();

        let result = async {
            self.require_mutation("create_folder")?;
            let name = validate_leaf_name("name", name)?;

            let parent = self.current_location();
            self.guard.check(&parent)?;

            let target = parent.join(name);
            self.guard.check(&target)?;

            if self.call("exists", &target, self.storage.exists(&target)).await? {
                return Err(NavError::already_exists(&target));
            }

            self.apply("create_dir", &target, self.storage.create_dir(&target))
                .await?;
            Ok::<_, NavError>(target)
        }
        .await;

        self.complete_mutation("create_folder", result).await
    }

    #[instrument(
        name = "delete_item",
        level = "info",
        skip(self, path),
        fields(path = %path.as_ref().display(), operation_id = tracing::field::Empty, is_dir = tracing::field::Empty)
    )]
    pub async fn delete_item(&self, path: impl AsRef<Path>) -> NavResult<()> {
        let path = path.as_ref();
        self.begin_mutation();

        let result = async {
            self.require_mutation("delete")?;
            self.guard.check(path)?;
            self.refuse_root(path)?;

            let meta = self.stat(path).await?;
            Span::current().record("is_dir", meta.is_dir);

            self.apply("remove", path, self.storage.remove(path, meta.is_dir))
                .await?;
            Ok::<_, NavError>(path.to_path_buf())
        }
        .await;

        self.complete_mutation("delete", result).await.map(|_| ())
    }

    /// Give `old_path` the leaf `new_name` inside its current parent.
    #[instrument(
        name = "rename_item",
        level = "info",
        skip(self, old_path),
        fields(source = %old_path.as_ref().display(), operation_id = tracing::field::Empty)
    )]
    pub async fn rename_item(&self, old_path: impl AsRef<Path>, new_name: &str) -> NavResult<PathBuf> {
        let old_path = old_path.as_ref();
        self.begin_mutation();

        let result = async {
            self.require_mutation("rename")?;
            self.guard.check(old_path)?;
            self.refuse_root(old_path)?;
            let new_name = validate_leaf_name("new_name", new_name)?;

            let parent = old_path
                .parent()
                .ok_or_else(|| NavError::permission_denied(old_path))?;
            let target = parent.join(new_name);
            self.guard.check(&target)?;

            self.stat(old_path).await?;
            if target == old_path {
                return Ok(target);
            }
            if self.call("exists", &target, self.storage.exists(&target)).await? {
                return Err(NavError::already_exists(&target));
            }

            self.apply("rename", old_path, self.storage.rename(old_path, &target))
                .await?;
            Ok::<_, NavError>(target)
        }
        .await;

        self.complete_mutation("rename", result).await
    }

    #[instrument(
        name = "copy_item",
        level = "info",
        skip(self, source, destination),
        fields(
            source = %source.as_ref().display(),
            destination = %destination.as_ref().display(),
            operation_id = tracing::field::Empty
        )
    )]
    pub async fn copy_item(
        &self,
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
    ) -> NavResult<PathBuf> {
        let (source, destination) = (source.as_ref(), destination.as_ref());
        self.begin_mutation();

        let result = async {
            self.require_mutation("copy")?;
            let meta = self.prepare_transfer(source, destination).await?;

            self.apply(
                "copy",
                source,
                self.storage.copy(source, destination, meta.is_dir),
            )
            .await?;
            Ok::<_, NavError>(destination.to_path_buf())
        }
        .await;

        self.complete_mutation("copy", result).await
    }

    #[instrument(
        name = "move_item",
        level = "info",
        skip(self, source, destination),
        fields(
            source = %source.as_ref().display(),
            destination = %destination.as_ref().display(),
            operation_id = tracing::field::Empty
        )
    )]
    pub async fn move_item(
        &self,
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
    ) -> NavResult<PathBuf> {
        let (source, destination) = (source.as_ref(), destination.as_ref());
        self.begin_mutation();

        let result = async {
            self.require_mutation("move")?;
            self.refuse_root(source)?;
            self.prepare_transfer(source, destination).await?;

            self.apply("move", source, self.storage.rename(source, destination))
                .await?;
            Ok::<_, NavError>(destination.to_path_buf())
        }
        .await;

        self.complete_mutation("move", result).await
    }

    /// Shared checks for copy and move; returns the source metadata.
    async fn prepare_transfer(&self, source: &Path, destination: &Path) -> NavResult<EntryMeta> {
        self.guard.check(source)?;
        self.guard.check(destination)?;

        let meta = self.stat(source).await?;
        if meta.is_dir && destination.starts_with(source) {
            return Err(NavError::invalid_input(
                "destination",
                "a directory cannot be placed inside itself",
            ));
        }

        if self
            .call("exists", destination, self.storage.exists(destination))
            .await?
        {
            return Err(NavError::already_exists(destination));
        }

        Ok(meta)
    }
}

// ------------------------------------------------------------
// Helpers
// ------------------------------------------------------------
impl NavigationManager {
    fn begin_mutation(&self) {
        let operation_id = nanoid::nanoid!();
        Span::current().record("operation_id", tracing::field::display(&operation_id));

        self.state_tx.send_modify(|s| {
            s.loading = true;
            s.last_error = None;
        });
    }

    fn require_mutation(&self, operation: &'static str) -> NavResult<()> {
        if self.tier.allows_mutation() {
            return Ok(());
        }

        Err(NavError::CapabilityUnsupported {
            operation,
            tier: self.tier,
        })
    }

    fn refuse_root(&self, path: &Path) -> NavResult<()> {
        if self.guard.is_any_root(path) {
            return Err(NavError::permission_denied(path));
        }
        Ok(())
    }

    async fn stat(&self, path: &Path) -> NavResult<EntryMeta> {
        self.call("stat", path, self.storage.stat(path)).await
    }

    /// Success refreshes the listing; failure is published and returned.
    async fn complete_mutation(
        &self,
        operation: &'static str,
        result: NavResult<PathBuf>,
    ) -> NavResult<PathBuf> {
        match result {
            Ok(path) => {
                info!(
                    marker = "MUTATION_COMPLETED",
                    operation_type = operation,
                    path = %path.display(),
                    "File operation completed successfully"
                );

                if let Err(e) = self.refresh().await {
                    warn!(
                        operation_type = operation,
                        error = %e,
                        "Refresh after successful mutation failed"
                    );
                }
                Ok(path)
            }
            Err(e) => {
                error!(
                    marker = "MUTATION_FAILED",
                    operation_type = operation,
                    category = %e.category(),
                    error = %e,
                    "File operation failed"
                );
                self.publish_failure(&e);
                Err(e)
            }
        }
    }

    fn publish_failure(&self, err: &NavError) {
        self.state_tx.send_modify(|s| {
            s.loading = false;
            s.last_error = Some(LastError::from(err));
        });
    }

    /// Mutating backend call, awaited to completion. Work handed to the
    /// filesystem cannot be cancelled, so no timeout applies here.
    async fn apply(
        &self,
        operation: &'static str,
        path: &Path,
        fut: impl Future<Output = io::Result<()>>,
    ) -> NavResult<()> {
        fut.await.map_err(|e| NavError::from_io(operation, path, e))
    }

    /// Read-only backend call under the configured timeout.
    async fn call<T>(
        &self,
        operation: &'static str,
        path: &Path,
        fut: impl Future<Output = io::Result<T>>,
    ) -> NavResult<T> {
        self.bounded(operation, async {
            fut.await.map_err(|e| NavError::from_io(operation, path, e))
        })
        .await
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = NavResult<T>>,
    ) -> NavResult<T> {
        match tokio::time::timeout(self.backend_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(NavError::TimedOut {
                operation,
                timeout_ms: u64::try_from(self.backend_timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

/// Trimmed leaf name, refusing separators and the dot entries.
fn validate_leaf_name<'a>(field: &str, name: &'a str) -> NavResult<&'a str> {
    let name = name.trim();

    if name.is_empty() {
        return Err(NavError::invalid_input(field, "must not be empty"));
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(NavError::invalid_input(field, "must be a single path segment"));
    }
    if name == "." || name == ".." {
        return Err(NavError::invalid_input(field, "is a reserved name"));
    }

    Ok(name)
}
