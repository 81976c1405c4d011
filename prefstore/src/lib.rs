//! # prefstore - Persistent Preferences for File Browsers
//!
//! Small key-value persistence layer used by pocketfs: application settings,
//! a bounded list of recently opened files, and a favorites list.
//!
//! ## Key Features
//! - One JSON blob per key, written atomically (temp file + rename)
//! - Read-modify-write of whole blobs, last writer wins
//! - Missing or corrupt blobs read back as defaults
//! - `SettingsStore` trait as the narrow seam consumed by the navigation core

pub mod error;
pub mod settings;
pub mod store;
pub mod recent;
pub mod favorites;

// Re-export main types for easy use
pub use error::{PrefError, PrefResult};
pub use favorites::FavoriteFile;
pub use recent::{MAX_RECENT_FILES, RecentFile};
pub use settings::{AppSettings, SettingsStore, Theme, ViewMode};
pub use store::PrefStore;
