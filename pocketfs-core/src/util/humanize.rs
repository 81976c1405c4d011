//! Display strings for entry sizes and modification times.

use chrono::{DateTime, Utc};

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// `"0 B"` for unknown or empty sizes, otherwise 1024-based units with two
/// decimals (`"1.50 KB"`).
#[expect(clippy::cast_precision_loss, reason = "display only")]
#[must_use]
pub fn format_size(bytes: Option<u64>) -> String {
    let bytes = match bytes {
        None | Some(0) => return "0 B".to_string(),
        Some(bytes) => bytes,
    };

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{size:.2} {}", SIZE_UNITS[unit])
}

/// Relative age of `modified` as seen from `now`.
///
/// Timestamps in the future count as today.
#[must_use]
pub fn format_age(modified: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = (now - modified).num_days();

    match days {
        ..=0 => format!("Today {}", modified.format("%H:%M")),
        1 => format!("Yesterday {}", modified.format("%H:%M")),
        2..=6 => format!("{days} days ago"),
        _ => modified.format("%b %-d, %Y").to_string(),
    }
}
