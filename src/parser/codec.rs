//! Field-level decoding helpers shared by every protocol decoder
//!
//! Percent-decoding, tolerant Base64, host:port splitting and the small
//! scalar parsers (ports, flags, bandwidth, port-hopping ranges).

use std::net::Ipv6Addr;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD};
use tracing::trace;

use super::error::LinkError;

// ============================================================================
// Percent Decoding
// ============================================================================

/// Percent-decodes `s`, leaving invalid escapes verbatim
///
/// Never fails: if the decoded bytes are not UTF-8 the input is returned as-is.
pub fn decode_percent(s: &str) -> String {
    urlencoding::decode(s)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| s.to_string())
}

// ============================================================================
// Base64 Decoding
// ============================================================================

/// Decodes Base64 content, trying multiple variants
///
/// Attempts standard, URL-safe and unpadded URL-safe alphabets, then retries
/// both alphabets with `=` padding appended. Whitespace is removed first.
pub fn decode_base64(content: &str) -> Result<Vec<u8>, LinkError> {
    let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(LinkError::decode("empty base64 payload"));
    }
    trace!("Attempting Base64 decode, cleaned length: {}", cleaned.len());

    if let Ok(decoded) = STANDARD.decode(&cleaned) {
        return Ok(decoded);
    }
    if let Ok(decoded) = URL_SAFE.decode(&cleaned) {
        return Ok(decoded);
    }
    if let Ok(decoded) = URL_SAFE_NO_PAD.decode(&cleaned) {
        return Ok(decoded);
    }

    let padded = add_base64_padding(&cleaned);
    if let Ok(decoded) = STANDARD.decode(&padded) {
        trace!("Decoded using standard Base64 with added padding");
        return Ok(decoded);
    }
    if let Ok(decoded) = URL_SAFE.decode(&padded) {
        trace!("Decoded using URL-safe Base64 with added padding");
        return Ok(decoded);
    }

    Err(LinkError::decode("invalid base64 payload"))
}

/// Like [`decode_base64`], but the result must be UTF-8 text
pub fn decode_base64_text(content: &str) -> Result<String, LinkError> {
    let bytes = decode_base64(content)?;
    String::from_utf8(bytes).map_err(|_| LinkError::decode("base64 payload is not valid UTF-8"))
}

/// Pads a Base64 string with `=` up to a multiple of 4
pub fn add_base64_padding(s: &str) -> String {
    let mut result = s.to_string();
    while !result.len().is_multiple_of(4) {
        result.push('=');
    }
    result
}

// ============================================================================
// Host / Port
// ============================================================================

/// Splits `host:port`, accepting bracketed IPv6 literals
///
/// The returned host never carries brackets.
pub fn split_host_port(authority: &str) -> Result<(String, u16), LinkError> {
    let (host, port) = split_host(authority)?;
    Ok((host, parse_port(port)?))
}

/// Splits `host:port` without interpreting the port text
///
/// QUIC dialects use this to accept port lists in the authority.
pub fn split_host(authority: &str) -> Result<(String, &str), LinkError> {
    let authority = authority.trim();

    if let Some(rest) = authority.strip_prefix('[') {
        let end = rest
            .find(']')
            .ok_or_else(|| LinkError::format("IPv6 address missing closing bracket"))?;
        let host = &rest[..end];
        if host.parse::<Ipv6Addr>().is_err() {
            return Err(LinkError::format(format!("invalid IPv6 literal '{host}'")));
        }
        let port = rest[end + 1..]
            .strip_prefix(':')
            .ok_or_else(|| LinkError::format("missing port after IPv6 address"))?;
        return Ok((host.to_string(), port));
    }

    if authority.contains(']') {
        return Err(LinkError::format("unbalanced IPv6 bracket"));
    }

    let (host, port) = authority
        .rsplit_once(':')
        .ok_or_else(|| LinkError::format(format!("missing port in '{authority}'")))?;
    if host.is_empty() {
        return Err(LinkError::format("missing host"));
    }
    if host.contains(':') {
        return Err(LinkError::format(format!(
            "IPv6 address '{host}' must be enclosed in brackets"
        )));
    }
    Ok((host.to_string(), port))
}

/// Parses a decimal port in `1..=65535`
pub fn parse_port(s: &str) -> Result<u16, LinkError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(LinkError::format("missing port"));
    }
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LinkError::format(format!("invalid port '{s}'")));
    }
    match s.parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(LinkError::format(format!("port '{s}' out of range"))),
    }
}

// ============================================================================
// Scalars
// ============================================================================

/// Boolean-like query flag: `1`/`true`/`0`/`false`, case-insensitive
pub fn parse_flag(s: &str) -> Option<bool> {
    let s = s.trim();
    if s == "1" || s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s == "0" || s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Bandwidth in Mbps, plain integers only
pub fn parse_mbps(s: &str) -> Option<u32> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Validates a port-hopping list such as `443,8000-9000`
///
/// Returns the list with whitespace removed.
pub fn parse_port_hops(s: &str) -> Result<String, LinkError> {
    let mut segments = Vec::new();
    for segment in s.split(',') {
        let segment = segment.trim();
        if segment.is_empty() {
            return Err(LinkError::format(format!("empty segment in port range '{s}'")));
        }
        match segment.split_once('-') {
            Some((start, end)) => {
                let start = parse_port(start)?;
                let end = parse_port(end)?;
                if start > end {
                    return Err(LinkError::format(format!(
                        "port range {start}-{end} has start after end"
                    )));
                }
                segments.push(format!("{start}-{end}"));
            }
            None => segments.push(parse_port(segment)?.to_string()),
        }
    }
    Ok(segments.join(","))
}

/// Splits a comma-separated list, dropping empty entries
pub fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
