//! Runtime capability tier detection.
//!
//! Some host runtimes embed the app inside a client that cannot grant
//! arbitrary filesystem traversal and only exposes a media index. The tier is
//! decided once per process from identity signals and never re-evaluated.

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::info;

use crate::config::{Platform, RuntimeConfig};

const ENV_OWNERSHIP: &str = "POCKETFS_APP_OWNERSHIP";
const ENV_EXECUTION: &str = "POCKETFS_EXECUTION_ENV";
const ENV_BUNDLE_ID: &str = "POCKETFS_BUNDLE_ID";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapabilityTier {
    /// Direct hierarchical filesystem access
    FullAccess,

    /// Flat, capped enumeration of the platform media index
    RestrictedMedia,
}

impl CapabilityTier {
    /// Mutations are only defined for direct filesystem access.
    #[inline]
    #[must_use]
    pub const fn allows_mutation(self) -> bool {
        matches!(self, Self::FullAccess)
    }

    #[inline]
    #[must_use]
    pub const fn access_method(self) -> &'static str {
        match self {
            Self::FullAccess => "direct",
            Self::RestrictedMedia => "media-library",
        }
    }
}

impl std::fmt::Display for CapabilityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s: &'_ str = match self {
            Self::FullAccess => "full-access",
            Self::RestrictedMedia => "restricted-media",
        };

        write!(f, "{s}")
    }
}

/// Who owns the running app bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppOwnership {
    /// Running inside a hosting client app
    #[serde(alias = "expo")]
    Hosted,

    Standalone,
}

impl AppOwnership {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hosted" | "expo" => Some(Self::Hosted),
            "standalone" => Some(Self::Standalone),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionEnvironment {
    /// Loaded by a store-distributed client app
    #[serde(alias = "storeClient")]
    StoreClient,

    Standalone,

    /// Bare workflow; says nothing about the tier
    Bare,
}

impl ExecutionEnvironment {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "store-client" | "storeclient" => Some(Self::StoreClient),
            "standalone" => Some(Self::Standalone),
            "bare" => Some(Self::Bare),
            _ => None,
        }
    }
}

/// Identity signals reported by the host runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeSignals {
    pub ownership: Option<AppOwnership>,

    pub environment: Option<ExecutionEnvironment>,

    pub bundle_id: Option<String>,
}

impl RuntimeSignals {
    #[must_use]
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self {
            ownership: config.ownership,
            environment: config.environment,
            bundle_id: config.bundle_id.clone(),
        }
    }

    /// Overlay `POCKETFS_*` environment variables on top of `self`.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup`; unparseable values are ignored.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(ownership) = lookup(ENV_OWNERSHIP).as_deref().and_then(AppOwnership::parse) {
            self.ownership = Some(ownership);
        }

        if let Some(env) = lookup(ENV_EXECUTION)
            .as_deref()
            .and_then(ExecutionEnvironment::parse)
        {
            self.environment = Some(env);
        }

        if let Some(bundle_id) = lookup(ENV_BUNDLE_ID).filter(|id| !id.trim().is_empty()) {
            self.bundle_id = Some(bundle_id);
        }

        self
    }
}

/// Decide the tier from `signals`.
///
/// Ownership is consulted first, then the execution environment, then (on
/// mobile platforms only) the bundle id against `host_markers`. Anything
/// inconclusive resolves to [`CapabilityTier::FullAccess`].
#[must_use]
pub fn detect_capability_tier(
    signals: &RuntimeSignals,
    platform: Platform,
    host_markers: &[String],
) -> CapabilityTier {
    match signals.ownership {
        Some(AppOwnership::Hosted) => return CapabilityTier::RestrictedMedia,
        Some(AppOwnership::Standalone) => return CapabilityTier::FullAccess,
        None => {}
    }

    match signals.environment {
        Some(ExecutionEnvironment::StoreClient) => return CapabilityTier::RestrictedMedia,
        Some(ExecutionEnvironment::Standalone) => return CapabilityTier::FullAccess,
        Some(ExecutionEnvironment::Bare) | None => {}
    }

    if platform.is_mobile() {
        if let Some(bundle_id) = signals.bundle_id.as_deref().map(str::trim) {
            if !bundle_id.is_empty() {
                let bundle_id = bundle_id.to_ascii_lowercase();
                let hosted = host_markers
                    .iter()
                    .any(|marker| bundle_id.contains(&marker.to_ascii_lowercase()));

                return if hosted {
                    CapabilityTier::RestrictedMedia
                } else {
                    CapabilityTier::FullAccess
                };
            }
        }
    }

    CapabilityTier::FullAccess
}

static PROCESS_TIER: OnceLock<CapabilityTier> = OnceLock::new();

/// The process-wide tier. The first call decides; later calls return the
/// memoised value whatever signals they pass.
pub fn process_capability_tier(
    signals: &RuntimeSignals,
    platform: Platform,
    host_markers: &[String],
) -> CapabilityTier {
    *PROCESS_TIER.get_or_init(|| {
        let tier = detect_capability_tier(signals, platform, host_markers);
        info!(
            marker = "CAPABILITY_DETECTED",
            operation_type = "capability",
            tier = %tier,
            platform = %platform,
            "Capability tier decided for this process"
        );
        tier
    })
}

/// Diagnostic snapshot of how the tier was decided.
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentInfo {
    pub tier: CapabilityTier,
    pub platform: Platform,
    pub signals: RuntimeSignals,
    pub access_method: &'static str,
}

impl EnvironmentInfo {
    #[must_use]
    pub fn new(tier: CapabilityTier, platform: Platform, signals: RuntimeSignals) -> Self {
        Self {
            tier,
            platform,
            signals,
            access_method: tier.access_method(),
        }
    }
}
