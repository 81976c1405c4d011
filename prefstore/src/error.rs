//! Error type for the preferences store

use compact_str::CompactString;
use std::io::ErrorKind;
use std::path::Path;
use thiserror::Error;

pub type PrefResult<T> = Result<T, PrefError>;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PrefError {
    #[error("Preferences directory unavailable: {0}")]
    StoreUnavailable(CompactString),

    #[error("Failed to read preference blob {path}: {kind:?}")]
    Read { path: CompactString, kind: ErrorKind },

    #[error("Atomic save of {path} failed: {kind:?}")]
    AtomicSave { path: CompactString, kind: ErrorKind },

    #[error("Preference blob {key} could not be encoded: {message}")]
    Encode {
        key: &'static str,
        message: CompactString,
    },

    #[error("Preference blob {key} is corrupted: {message}")]
    Corrupted {
        key: &'static str,
        message: CompactString,
    },
}

impl PrefError {
    /// Corruption is recovered by falling back to defaults
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Corrupted { .. })
    }

    #[inline]
    pub fn read(path: &Path, io_error: &std::io::Error) -> Self {
        Self::Read {
            path: CompactString::from(path.to_string_lossy()),
            kind: io_error.kind(),
        }
    }

    #[inline]
    pub fn atomic_save(path: &Path, io_error: &std::io::Error) -> Self {
        Self::AtomicSave {
            path: CompactString::from(path.to_string_lossy()),
            kind: io_error.kind(),
        }
    }
}
