//! Utility functions for serde serialization/deserialization.
//!
//! Serde defaults for the settings types and value formatting for the
//! document types.

// ============================================================================
// Boolean Helpers
// ============================================================================

/// Serde default for flags that are on unless stated otherwise.
#[inline]
pub fn default_true() -> bool {
    true
}

// ============================================================================
// Mihomo Value Helpers
// ============================================================================

/// Formats a plain Mbps figure the way Mihomo expects bandwidth strings.
pub fn mbps(value: &str) -> String {
    format!("{value} Mbps")
}

/// Interprets a stored `"true"`/`"false"` flag, `None` if absent or malformed.
pub fn flag(value: Option<&str>) -> Option<bool> {
    match value {
        Some("true") => Some(true),
        Some("false") => Some(false),
        _ => None,
    }
}

/// Splits a comma-separated header value into trimmed, non-empty parts.
pub fn comma_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}
