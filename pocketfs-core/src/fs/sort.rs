use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

use crate::error::NavError;
use crate::fs::entry::Entry;

/// Secondary ordering applied after directories-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,

    /// Newest first
    Date,

    /// Largest first
    Size,

    Type,
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s: &'_ str = match self {
            Self::Name => "name",
            Self::Date => "date",
            Self::Size => "size",
            Self::Type => "type",
        };

        write!(f, "{s}")
    }
}

impl FromStr for SortKey {
    type Err = NavError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "date" => Ok(Self::Date),
            "size" => Ok(Self::Size),
            "type" => Ok(Self::Type),
            other => Err(NavError::invalid_input(
                "sort",
                &format!("unknown sort key '{other}', expected name|date|size|type"),
            )),
        }
    }
}

/// Total order: directories first, then `key`. Equal keys compare equal so a
/// stable sort keeps their input order.
#[must_use]
pub fn compare_entries(a: &Entry, b: &Entry, key: SortKey) -> Ordering {
    b.is_dir().cmp(&a.is_dir()).then_with(|| match key {
        SortKey::Name => alphanumeric_sort::compare_str(
            a.name().to_lowercase(),
            b.name().to_lowercase(),
        ),

        // None < Some, so reversing puts missing timestamps last
        SortKey::Date => b.modified().cmp(&a.modified()),

        SortKey::Size => b.size().unwrap_or(0).cmp(&a.size().unwrap_or(0)),

        SortKey::Type => a.kind().as_str().cmp(b.kind().as_str()),
    })
}

pub fn sort_entries(entries: &mut [Entry], key: SortKey) {
    entries.sort_by(|a: &Entry, b: &Entry| -> Ordering { compare_entries(a, b, key) });
}
