//! Input content detection
//!
//! Pasted or uploaded link batches arrive either as a plain list (one link
//! per line) or as a whole Base64-wrapped list. This module turns either
//! into individual link lines for the parser.

use tracing::debug;

use super::codec::decode_base64_text;
use super::link::extract_scheme;
use super::protocols::supported_schemes;

// ============================================================================
// Content Detection
// ============================================================================

/// Detected shape of a link batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// One link per line
    PlainList,
    /// Base64 encoded link list
    Base64List,
    /// Nothing recognizable; lines are passed through as-is
    Unknown,
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentKind::PlainList => write!(f, "plain link list"),
            ContentKind::Base64List => write!(f, "Base64 link list"),
            ContentKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Detects whether content is a plain or Base64-wrapped link list
pub fn detect_content_kind(content: &str) -> ContentKind {
    let trimmed = content.trim();
    debug!("Detecting content kind, length: {} bytes", trimmed.len());

    if link_lines(trimmed).any(is_proxy_link) {
        return ContentKind::PlainList;
    }
    if is_base64_list(trimmed) {
        return ContentKind::Base64List;
    }
    ContentKind::Unknown
}

/// Splits content into link lines, unwrapping a Base64 list if needed
///
/// Blank lines and `#` comments are dropped.
pub fn split_links(content: &str) -> Vec<String> {
    let kind = detect_content_kind(content);
    debug!("Detected {kind}");

    let decoded = match kind {
        ContentKind::Base64List => decode_base64_text(content.trim()).ok(),
        _ => None,
    };
    let text = decoded.as_deref().unwrap_or(content);
    link_lines(text).map(str::to_string).collect()
}

/// Splits a `|`-separated link parameter (`urls=a|b|c`)
pub fn split_link_param(param: &str) -> Vec<String> {
    param
        .split('|')
        .map(str::trim)
        .filter(|link| !link.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether a line starts with a scheme some decoder handles
pub fn is_proxy_link(line: &str) -> bool {
    extract_scheme(line.trim())
        .map(|scheme| supported_schemes().any(|s| s == scheme))
        .unwrap_or(false)
}

fn link_lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

fn is_base64_list(content: &str) -> bool {
    let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.len() < 4 {
        return false;
    }
    let alphabet_ok = cleaned.chars().all(|c| {
        c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=' | '-' | '_')
    });
    if !alphabet_ok {
        return false;
    }
    decode_base64_text(&cleaned)
        .map(|decoded| decoded.lines().any(is_proxy_link))
        .unwrap_or(false)
}
