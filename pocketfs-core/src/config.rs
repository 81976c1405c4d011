//! ============================================================================
//! # Config: Application Configuration Loader and Saver
//!
//! Loads and saves settings as TOML from the cross-platform config path
//! resolved through [`directories`](https://docs.rs/directories).
//!
//! ## Features
//! - Defaults are written out when no config file exists
//! - Async load/save for use from Tokio
//! - Every section is optional in the file; missing sections use defaults
//!
//! ## Example
//! ```rust,ignore
//! let config = Config::load().await?;
//! let roots = config.storage.root_policy()?;
//! ```

use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use tokio::fs as TokioFs;

use crate::access::capability::{AppOwnership, ExecutionEnvironment};
use crate::access::guard::RootPolicy;
use crate::fs::sort::SortKey;
use crate::logging::LoggerConfig;

const QUALIFIER: &str = "org";
const ORGANIZATION: &str = "pocketfs";
const APPLICATION: &str = "PocketFS";

/// Host platform; decides which roots are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,

    Ios,

    Desktop,
}

impl Platform {
    /// Platform of the compile target.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(target_os = "android") {
            Self::Android
        } else if cfg!(target_os = "ios") {
            Self::Ios
        } else {
            Self::Desktop
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_mobile(self) -> bool {
        matches!(self, Self::Android | Self::Ios)
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s: &'_ str = match self {
            Self::Android => "android",
            Self::Ios => "ios",
            Self::Desktop => "desktop",
        };

        write!(f, "{s}")
    }
}

/// Where the accessible roots live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub platform: Platform,

    /// User storage root on Android when full access is granted
    pub shared_storage_root: PathBuf,

    /// Application documents dir; defaults under the project data dir
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents_dir: Option<PathBuf>,

    /// Application cache dir; defaults to the project cache dir
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    pub show_hidden: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            platform: Platform::current(),
            shared_storage_root: PathBuf::from("/storage/emulated/0/"),
            documents_dir: None,
            cache_dir: None,
            show_hidden: false,
        }
    }
}

impl StorageConfig {
    /// Resolve the configured (or default) roots into a policy.
    pub fn root_policy(&self) -> anyhow::Result<RootPolicy> {
        let documents_dir: PathBuf = match &self.documents_dir {
            Some(dir) => dir.clone(),
            None => project_dirs()?.data_dir().join("documents"),
        };

        let cache_dir: PathBuf = match &self.cache_dir {
            Some(dir) => dir.clone(),
            None => project_dirs()?.cache_dir().to_path_buf(),
        };

        Ok(RootPolicy {
            platform: self.platform,
            shared_storage_root: self.shared_storage_root.clone(),
            documents_dir,
            cache_dir,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub default_sort: SortKey,

    /// Assets fetched per restricted-mode listing
    pub media_page_size: usize,

    /// Upper bound on any single backend call
    #[serde(with = "humantime_serde")]
    pub backend_timeout: Duration,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_sort: SortKey::Name,
            media_page_size: 100,
            backend_timeout: Duration::from_secs(30),
        }
    }
}

/// Runtime identity signals used by the capability detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ownership: Option<AppOwnership>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<ExecutionEnvironment>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,

    /// Bundle id fragments that identify a hosting client app
    pub host_bundle_markers: Vec<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            ownership: None,
            environment: None,
            bundle_id: None,
            host_bundle_markers: vec!["exp.exponent".to_string()],
        }
    }
}

/// Main configuration struct for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub listing: ListingConfig,

    #[serde(default)]
    pub runtime: RuntimeConfig,

    #[serde(default)]
    pub logging: LoggerConfig,
}

impl Config {
    /// Loads config from the platform config dir, writing defaults when absent.
    pub async fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path()?).await
    }

    pub async fn load_from(path: &Path) -> anyhow::Result<Self> {
        if TokioFs::try_exists(path).await.unwrap_or(false) {
            info!("Loading config from {}", path.display());

            let text = TokioFs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let cfg: Self = toml::from_str(&text)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?;

            Ok(cfg)
        } else {
            info!(
                "No config file found at {}, using default configuration. Creating it now.",
                path.display()
            );

            let default_config = Self::default();
            default_config.save_to(path).await?;

            Ok(default_config)
        }
    }

    pub async fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path()?).await
    }

    pub async fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        info!("Saving config to {}", path.display());

        if let Some(parent) = path.parent() {
            TokioFs::create_dir_all(parent).await?;
        }

        let toml_str = toml::to_string_pretty(self)?;
        TokioFs::write(path, toml_str).await?;

        Ok(())
    }

    /// Returns the canonical config file path using `directories::ProjectDirs`.
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(project_dirs()?.config_dir().to_path_buf())
    }
}

fn project_dirs() -> anyhow::Result<ProjectDirs> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
        .ok_or_else(|| anyhow::anyhow!("Could not determine project directories."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_config_is_created_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let cfg = Config::load_from(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(cfg.listing.media_page_size, 100);
        assert_eq!(cfg.listing.backend_timeout, Duration::from_secs(30));
        assert_eq!(cfg.runtime.host_bundle_markers, vec!["exp.exponent"]);
    }

    #[tokio::test]
    async fn test_partial_config_fills_in_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        tokio::fs::write(
            &path,
            r#"
[storage]
platform = "android"
documents_dir = "/data/app/docs"

[listing]
default_sort = "size"
backend_timeout = "5s"

[runtime]
ownership = "hosted"
"#,
        )
        .await
        .unwrap();

        let cfg = Config::load_from(&path).await.unwrap();
        assert_eq!(cfg.storage.platform, Platform::Android);
        assert_eq!(cfg.storage.shared_storage_root, PathBuf::from("/storage/emulated/0/"));
        assert_eq!(cfg.listing.default_sort, SortKey::Size);
        assert_eq!(cfg.listing.backend_timeout, Duration::from_secs(5));
        assert_eq!(cfg.listing.media_page_size, 100);
        assert_eq!(cfg.runtime.ownership, Some(AppOwnership::Hosted));
    }

    #[tokio::test]
    async fn test_save_then_load_preserves_overrides() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut cfg = Config::default();
        cfg.storage.show_hidden = true;
        cfg.listing.default_sort = SortKey::Date;
        cfg.save_to(&path).await.unwrap();

        let loaded = Config::load_from(&path).await.unwrap();
        assert!(loaded.storage.show_hidden);
        assert_eq!(loaded.listing.default_sort, SortKey::Date);
    }

    #[test]
    fn test_explicit_dirs_feed_root_policy() {
        let storage = StorageConfig {
            platform: Platform::Ios,
            documents_dir: Some(PathBuf::from("/app/Documents")),
            cache_dir: Some(PathBuf::from("/app/Caches")),
            ..StorageConfig::default()
        };

        let policy = storage.root_policy().unwrap();
        assert_eq!(policy.documents_dir, PathBuf::from("/app/Documents"));
        assert_eq!(policy.cache_dir, PathBuf::from("/app/Caches"));
    }
}
