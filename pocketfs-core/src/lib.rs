//! # pocketfs-core
//!
//! Sandboxed navigation and file operations for a mobile-style file browser.
//!
//! Every path that enters the [`manager::NavigationManager`] is checked by the
//! [`access::guard::AccessGuard`] before any backend is contacted. Listing is
//! delegated to one of two strategies picked once per process by the
//! capability detector: direct filesystem enumeration, or a flat media index
//! when the host runtime cannot grant filesystem traversal.

pub mod error;

pub mod config;

pub mod logging;

pub mod fs {
    pub mod classify;
    pub use classify::{EntryKind, classify};

    pub mod entry;
    pub use entry::Entry;

    pub mod sort;
    pub use sort::{SortKey, sort_entries};
}

pub mod access {
    pub mod capability;
    pub use capability::{CapabilityTier, EnvironmentInfo, RuntimeSignals};

    pub mod guard;
    pub use guard::{AccessGuard, RootPolicy};
}

pub mod backend {
    pub mod storage;
    pub use storage::{EntryMeta, RawEntry, StorageBackend};

    pub mod local;
    pub use local::LocalStorage;

    pub mod media;
    pub use media::{
        IndexedMediaLibrary, MediaAsset, MediaKind, MediaLibrary, MediaPermission, MediaQuery,
        MediaSort,
    };

    pub mod permissions;
    pub use permissions::{GrantedPermissions, PermissionBroker};
}

pub mod model {
    pub mod nav_state;
    pub use nav_state::NavigationState;
}

pub mod operators {
    pub mod listing;
    pub use listing::{FullAccessLister, Lister, RestrictedMediaLister};
}

pub mod manager;

pub mod util {
    pub mod humanize;
}

pub use error::{ErrorCategory, LastError, NavError, NavResult};
pub use manager::{NavigationManager, NavigationManagerBuilder};
pub use model::NavigationState;
