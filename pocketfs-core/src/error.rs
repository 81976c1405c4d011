//! Core error handling module
//!
//! • One `NavError` per failed operation, returned to the caller
//! • A flattened [`LastError`] descriptor published to observers
//! • `#[non_exhaustive]` for forward-compatible extension
use std::io::{self, ErrorKind};
use std::path::Path;

use compact_str::CompactString;
use prefstore::PrefError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::access::capability::CapabilityTier;

/// Convenient alias carrying our unified error type
pub type NavResult<T> = Result<T, NavError>;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum NavError {
    // ────────────────────────────────────────────────────────────
    // Boundary
    // ────────────────────────────────────────────────────────────
    #[error("Access denied: {path}")]
    PermissionDenied { path: CompactString },

    #[error("Already at root: {root}")]
    AlreadyAtRoot { root: CompactString },

    // ────────────────────────────────────────────────────────────
    // Targets
    // ────────────────────────────────────────────────────────────
    #[error("Not found: {path}")]
    NotFound { path: CompactString },

    #[error("Already exists: {path}")]
    AlreadyExists { path: CompactString },

    // ────────────────────────────────────────────────────────────
    // Capability
    // ────────────────────────────────────────────────────────────
    #[error("{operation} is not available in {tier} mode")]
    CapabilityUnsupported {
        operation: &'static str,
        tier: CapabilityTier,
    },

    // ────────────────────────────────────────────────────────────
    // Input validation
    // ────────────────────────────────────────────────────────────
    #[error("Invalid input: {field} - {message}")]
    InvalidInput {
        field: CompactString,
        message: CompactString,
    },

    // ────────────────────────────────────────────────────────────
    // Backend
    // ────────────────────────────────────────────────────────────
    #[error("{operation} failed for {path}: {source}")]
    Backend {
        operation: &'static str,
        path: CompactString,
        #[source]
        source: io::Error,
    },

    #[error("{operation} timed out after {timeout_ms} ms")]
    TimedOut {
        operation: &'static str,
        timeout_ms: u64,
    },

    #[error("Preferences unavailable: {0}")]
    Preferences(#[from] PrefError),
}

/// Coarse grouping used by observers to pick a presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Permission,

    NotFound,

    Capability,

    Input,

    Backend,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s: &'_ str = match self {
            Self::Permission => "permission",
            Self::NotFound => "not_found",
            Self::Capability => "capability",
            Self::Input => "input",
            Self::Backend => "backend",
        };

        write!(f, "{s}")
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Constructors
// ────────────────────────────────────────────────────────────────────────────
impl NavError {
    #[inline]
    pub fn permission_denied(path: &Path) -> Self {
        Self::PermissionDenied {
            path: CompactString::from(path.to_string_lossy()),
        }
    }

    #[inline]
    pub fn not_found(path: &Path) -> Self {
        Self::NotFound {
            path: CompactString::from(path.to_string_lossy()),
        }
    }

    #[inline]
    pub fn already_exists(path: &Path) -> Self {
        Self::AlreadyExists {
            path: CompactString::from(path.to_string_lossy()),
        }
    }

    #[inline]
    pub fn invalid_input(field: &str, message: &str) -> Self {
        Self::InvalidInput {
            field: CompactString::new(field),
            message: CompactString::new(message),
        }
    }

    /// Map a backend I/O failure onto the taxonomy by its kind.
    pub fn from_io(operation: &'static str, path: &Path, source: io::Error) -> Self {
        match source.kind() {
            ErrorKind::NotFound => Self::not_found(path),
            ErrorKind::PermissionDenied => Self::permission_denied(path),
            ErrorKind::AlreadyExists => Self::already_exists(path),
            _ => Self::Backend {
                operation,
                path: CompactString::from(path.to_string_lossy()),
                source,
            },
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Fast classification helpers
// ────────────────────────────────────────────────────────────────────────────
impl NavError {
    #[inline]
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::PermissionDenied { .. } => ErrorCategory::Permission,

            Self::NotFound { .. } => ErrorCategory::NotFound,

            Self::CapabilityUnsupported { .. } => ErrorCategory::Capability,

            Self::AlreadyAtRoot { .. }
            | Self::AlreadyExists { .. }
            | Self::InvalidInput { .. } => ErrorCategory::Input,

            Self::Backend { .. } | Self::TimedOut { .. } | Self::Preferences(_) => {
                ErrorCategory::Backend
            }
        }
    }

    /// Whether the user can fix the situation and try again
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::AlreadyExists { .. }
                | Self::AlreadyAtRoot { .. }
                | Self::InvalidInput { .. }
                | Self::TimedOut { .. }
        )
    }

    // Used for JSON log grouping
    #[inline]
    #[must_use]
    pub const fn operation_type(&self) -> &'static str {
        match self {
            Self::PermissionDenied { .. } | Self::AlreadyAtRoot { .. } => "path_access",

            Self::NotFound { .. } | Self::AlreadyExists { .. } => "target_state",

            Self::CapabilityUnsupported { .. } => "capability",

            Self::InvalidInput { .. } => "input_validation",

            Self::Backend { .. } | Self::TimedOut { .. } => "backend",

            Self::Preferences(_) => "preferences",
        }
    }
}

/// Published error descriptor; cleared at the start of every operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastError {
    pub category: ErrorCategory,

    pub message: String,
}

impl From<&NavError> for LastError {
    fn from(err: &NavError) -> Self {
        Self {
            category: err.category(),
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for LastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_errors_map_by_kind() {
        let path = Path::new("/root/a");

        let err = NavError::from_io("list", path, io::Error::from(ErrorKind::NotFound));
        assert_eq!(err.category(), ErrorCategory::NotFound);

        let err = NavError::from_io("list", path, io::Error::from(ErrorKind::PermissionDenied));
        assert_eq!(err.category(), ErrorCategory::Permission);

        let err = NavError::from_io("create_dir", path, io::Error::from(ErrorKind::AlreadyExists));
        assert!(matches!(err, NavError::AlreadyExists { .. }));

        let err = NavError::from_io("copy", path, io::Error::other("disk full"));
        assert_eq!(err.category(), ErrorCategory::Backend);
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_last_error_carries_category_and_message() {
        let err = NavError::CapabilityUnsupported {
            operation: "delete",
            tier: CapabilityTier::RestrictedMedia,
        };
        let last = LastError::from(&err);

        assert_eq!(last.category, ErrorCategory::Capability);
        assert_eq!(last.message, "delete is not available in restricted-media mode");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_timeouts_are_recoverable_backend_errors() {
        let err = NavError::TimedOut {
            operation: "list",
            timeout_ms: 30_000,
        };
        assert!(err.is_recoverable());
        assert_eq!(err.category(), ErrorCategory::Backend);
        assert_eq!(err.operation_type(), "backend");
    }
}
