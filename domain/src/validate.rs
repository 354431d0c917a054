//! Row input validation helpers. Keep logic minimal and deterministic.

use url::Url;

use crate::DEFAULT_VALIDITY_MINUTES;

/// Validate an original URL and return the text to store.
///
/// The input must parse as an absolute URL with a host (`https://example.com`,
/// `ftp://files.local/x`). Surrounding whitespace is dropped; the rest is kept
/// exactly as typed rather than the parser's normalized form.
pub fn validate_original_url(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = Url::parse(trimmed).ok()?;
    if !parsed.has_host() {
        return None;
    }
    Some(trimmed.to_string())
}

/// Parse a validity window in minutes.
///
/// Empty input means the default window. Otherwise the leading integer is
/// taken the way a browser number field hands it over: leading whitespace is
/// skipped, an optional sign is honored, and anything after the digits is
/// ignored (`"10min"` is 10, `"1.5"` is 1). Missing digits, zero, negative
/// values and values that overflow are rejected.
pub fn parse_validity_minutes(s: &str) -> Option<u64> {
    if s.is_empty() {
        return Some(DEFAULT_VALIDITY_MINUTES);
    }
    let rest = s.trim_start();
    let (negative, rest) = match rest.as_bytes().first() {
        Some(b'-') => (true, &rest[1..]),
        Some(b'+') => (false, &rest[1..]),
        _ => (false, rest),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let digits = &rest[..digits_len];
    if negative {
        // Any signed value with digits is zero or below.
        return None;
    }
    let minutes: u64 = digits.parse().ok()?;
    if minutes == 0 {
        return None;
    }
    Some(minutes)
}
