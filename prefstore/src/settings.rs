use crate::PrefResult;
use crate::store::{PrefStore, SETTINGS_KEY};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Colour scheme selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Ipn,

    Escom,
}

/// How a directory listing is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    List,

    Grid,
}

impl std::fmt::Display for ViewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::List => write!(f, "list"),
            Self::Grid => write!(f, "grid"),
        }
    }
}

/// Persisted preference bag. Always read and written as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub theme: Theme,

    pub view_mode: ViewMode,
}

/// The settings surface consumed by the navigation core.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_settings(&self) -> PrefResult<AppSettings>;

    async fn save_settings(&self, settings: AppSettings) -> PrefResult<()>;
}

#[async_trait]
impl SettingsStore for PrefStore {
    async fn get_settings(&self) -> PrefResult<AppSettings> {
        self.read_blob(SETTINGS_KEY).await
    }

    async fn save_settings(&self, settings: AppSettings) -> PrefResult<()> {
        self.write_blob(SETTINGS_KEY, &settings).await
    }
}
