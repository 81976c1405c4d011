//! Path accessibility guard.
//!
//! A path is accessible when its text starts with one of the configured roots
//! followed by a separator (`/` or `\`, whichever the host joins with) and the
//! remainder holds no `..` segment, also after percent-decoding.

use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use tracing::warn;

use crate::access::capability::CapabilityTier;
use crate::config::Platform;
use crate::error::{NavError, NavResult};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Root {
    /// Ends with exactly one platform separator
    path: PathBuf,

    /// Root text with trailing separators removed
    base: String,
}

impl Root {
    fn new(path: &Path) -> Self {
        let text = path.to_string_lossy();
        let base = text.trim_end_matches(['/', '\\']).to_string();

        let mut normalised = String::with_capacity(base.len() + 1);
        normalised.push_str(&base);
        normalised.push(MAIN_SEPARATOR);

        Self {
            path: PathBuf::from(normalised),
            base,
        }
    }

    /// The text after the root and its separator (`/` or `\`), or `None`
    /// when `path` is not under it.
    fn remainder<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.base.as_str())?;

        if rest.is_empty() {
            return (!path.is_empty()).then_some("");
        }
        rest.strip_prefix(['/', '\\'])
    }
}

/// Pure containment predicate over one primary root plus optional extras.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGuard {
    root: Root,
    extra_roots: Vec<Root>,
}

impl AccessGuard {
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: Root::new(root.as_ref()),
            extra_roots: Vec::new(),
        }
    }

    /// Another accessible tree. Navigation still treats the primary root as
    /// the top for `navigate_back`.
    #[must_use]
    pub fn with_extra_root(mut self, root: impl AsRef<Path>) -> Self {
        self.extra_roots.push(Root::new(root.as_ref()));
        self
    }

    /// Primary root, normalised with a trailing separator.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root.path
    }

    /// Whether `path` names the primary root itself.
    #[must_use]
    pub fn is_root(&self, path: &Path) -> bool {
        let text = path.to_string_lossy();
        matches!(self.root.remainder(&text), Some(""))
    }

    /// Whether `path` names any configured root itself.
    #[must_use]
    pub fn is_any_root(&self, path: &Path) -> bool {
        let text = path.to_string_lossy();
        std::iter::once(&self.root)
            .chain(&self.extra_roots)
            .any(|root| matches!(root.remainder(&text), Some("")))
    }

    #[must_use]
    pub fn is_accessible(&self, path: &Path) -> bool {
        let text = path.to_string_lossy();

        std::iter::once(&self.root)
            .chain(&self.extra_roots)
            .filter_map(|root| root.remainder(&text))
            .any(|rest| !contains_parent_reference(rest))
    }

    /// [`is_accessible`](Self::is_accessible) as a `Result`.
    pub fn check(&self, path: &Path) -> NavResult<()> {
        if self.is_accessible(path) {
            return Ok(());
        }

        warn!(
            marker = "GUARD_REJECTED",
            operation_type = "path_access",
            path = %path.display(),
            root = %self.root().display(),
            "Path rejected by access guard"
        );
        Err(NavError::permission_denied(path))
    }
}

/// Whether any `/`- or `\`-separated segment of `rest` is `..` once
/// percent-encoded dots and separators are decoded.
fn contains_parent_reference(rest: &str) -> bool {
    let decoded = decode_path_escapes(rest);
    decoded.split(['/', '\\']).any(|segment| segment == "..")
}

/// Decode `%2e`, `%2f`, `%5c` and `%25` until nothing changes, so doubly
/// encoded traversal is caught too.
fn decode_path_escapes(input: &str) -> String {
    let mut current = input.to_string();

    loop {
        let next = decode_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn decode_once(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let pair = (bytes[i + 1].to_ascii_lowercase(), bytes[i + 2].to_ascii_lowercase());
            let decoded = match pair {
                (b'2', b'e') => Some('.'),
                (b'2', b'f') => Some('/'),
                (b'5', b'c') => Some('\\'),
                (b'2', b'5') => Some('%'),
                _ => None,
            };

            if let Some(c) = decoded {
                out.push(c);
                i += 3;
                continue;
            }
        }

        // Only ASCII escapes are decoded, so copying char by char is safe
        let ch = input[i..].chars().next().unwrap_or('\u{FFFD}');
        out.push(ch);
        i += ch.len_utf8();
    }

    out
}

/// Concrete roots for one host, resolved from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootPolicy {
    pub platform: Platform,
    pub shared_storage_root: PathBuf,
    pub documents_dir: PathBuf,
    pub cache_dir: PathBuf,
}

impl RootPolicy {
    /// Android with full access gets the shared storage root. Every other
    /// combination is confined to the app documents dir, and non-Android
    /// hosts may also reach the app cache dir.
    #[must_use]
    pub fn guard(&self, tier: CapabilityTier) -> AccessGuard {
        match (self.platform, tier) {
            (Platform::Android, CapabilityTier::FullAccess) => {
                AccessGuard::new(&self.shared_storage_root)
            }
            (Platform::Android, CapabilityTier::RestrictedMedia) => {
                AccessGuard::new(&self.documents_dir)
            }
            _ => AccessGuard::new(&self.documents_dir).with_extra_root(&self.cache_dir),
        }
    }

    /// Tree indexed by the media library in restricted mode.
    #[must_use]
    pub fn media_root(&self) -> &Path {
        match self.platform {
            Platform::Android => &self.shared_storage_root,
            Platform::Ios | Platform::Desktop => &self.documents_dir,
        }
    }
}
