//! Shared presentation utilities for the URL shortener workspace.
//!
//! Provides short-link URL building and timestamp formatting used when
//! rendering records.

use chrono::{DateTime, SecondsFormat, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

// ============================================================================
// URL Building
// ============================================================================

/// Build a short URL from a base origin and shortcode.
///
/// Falls back to `/{shortcode}` when the base is empty. Trailing slashes on
/// the base are ignored.
pub fn build_short_url(base: &str, shortcode: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        format!("/{}", shortcode)
    } else {
        format!("{}/{}", base, shortcode)
    }
}

// ============================================================================
// Time Utilities
// ============================================================================

/// Rendered in place of a timestamp outside the calendar range.
pub const INVALID_DATE: &str = "Invalid Date";

/// Convert SystemTime to RFC3339 string (seconds precision, UTC).
///
/// Returns [`INVALID_DATE`] instead of panicking when `t` lies outside what
/// chrono can represent.
pub fn system_time_to_rfc3339(t: SystemTime) -> String {
    let secs = match t.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_secs()).ok(),
        Err(e) => i64::try_from(e.duration().as_secs()).ok().map(|s| -s),
    };
    secs.and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| INVALID_DATE.to_string())
}

/// Minutes left until `expiry`, rounded down; zero once it has passed.
pub fn minutes_remaining(now: SystemTime, expiry: SystemTime) -> u64 {
    expiry
        .duration_since(now)
        .map(|d| d.as_secs() / 60)
        .unwrap_or(0)
}
