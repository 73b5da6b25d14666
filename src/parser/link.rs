//! Structural splitting of share links
//!
//! Share links are not always valid URLs (base64 userinfo with `/`, port
//! lists in the authority, raw unicode fragments), so they are split by hand
//! instead of going through `url::Url`. Query strings are still decoded with
//! `url::form_urlencoded`.

use tracing::warn;

use super::codec::{decode_percent, parse_flag};
use super::error::LinkError;

// ============================================================================
// Scheme
// ============================================================================

/// Extracts the lowercase scheme from a link
pub fn extract_scheme(link: &str) -> Result<String, LinkError> {
    let (scheme, _) = link
        .split_once("://")
        .ok_or_else(|| LinkError::format("missing scheme separator ://"))?;
    if scheme.is_empty()
        || !scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    {
        return Err(LinkError::format(format!("invalid scheme '{scheme}'")));
    }
    Ok(scheme.to_ascii_lowercase())
}

// ============================================================================
// Link Parts
// ============================================================================

/// Raw pieces of `scheme://userinfo@authority/path?query#fragment`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkParts<'a> {
    pub scheme: String,
    /// Everything between `://` and `?`/`#`, undecoded
    pub body: &'a str,
    /// Text before the `@` that ends the authority's userinfo, undecoded
    pub userinfo: Option<&'a str>,
    /// `host:port` text, undecoded
    pub authority: &'a str,
    /// Path after the authority, including the leading `/`
    pub path: &'a str,
    pub query: QueryParams,
    /// Percent-decoded and trimmed; `None` when absent or blank
    pub fragment: Option<String>,
}

impl<'a> LinkParts<'a> {
    pub fn split(link: &'a str) -> Result<Self, LinkError> {
        let scheme = extract_scheme(link)?;
        let rest = link
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or_default();

        let (rest, fragment) = match rest.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment)),
            None => (rest, None),
        };
        let (body, query) = match rest.split_once('?') {
            Some((body, query)) => (body, query),
            None => (rest, ""),
        };

        let (userinfo, host_and_path) = match userinfo_end(body) {
            Some(at) => (Some(&body[..at]), &body[at + 1..]),
            None => (None, body),
        };
        let (authority, path) = match host_and_path.find('/') {
            Some(slash) => (&host_and_path[..slash], &host_and_path[slash..]),
            None => (host_and_path, ""),
        };

        let fragment = fragment
            .map(|f| decode_percent(f).trim().to_string())
            .filter(|f| !f.is_empty());

        Ok(Self {
            scheme,
            body,
            userinfo,
            authority,
            path,
            query: QueryParams::parse(query),
            fragment,
        })
    }

    /// Percent-decoded userinfo, `None` when absent or empty
    pub fn decoded_userinfo(&self) -> Option<String> {
        self.userinfo
            .map(decode_percent)
            .filter(|info| !info.is_empty())
    }
}

/// Position of the `@` separating userinfo from host
///
/// The `@` is looked up before the first `/`, so a path may contain `@`.
/// When that slice holds no `@` and is not a `host:port`, the `/` belongs to
/// base64 userinfo and the last `@` of the whole body is used.
fn userinfo_end(body: &str) -> Option<usize> {
    let authority_end = body.find('/').unwrap_or(body.len());
    let authority = &body[..authority_end];
    if let Some(at) = authority.rfind('@') {
        return Some(at);
    }
    if looks_like_host_port(authority) {
        return None;
    }
    body.rfind('@')
}

/// `host:port` or `host:port-list`, IPv6 brackets allowed
fn looks_like_host_port(authority: &str) -> bool {
    authority.rsplit_once(':').is_some_and(|(host, ports)| {
        !host.is_empty()
            && !ports.is_empty()
            && ports.chars().all(|c| c.is_ascii_digit() || matches!(c, ',' | '-'))
    })
}

// ============================================================================
// Query Parameters
// ============================================================================

/// Ordered query pairs that decoders consume key by key
///
/// Whatever is left after a decoder has taken its known keys is retained on
/// the node as unknown extras.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn parse(query: &str) -> Self {
        let pairs = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .filter(|(key, _)| !key.is_empty())
            .collect();
        Self { pairs }
    }

    /// Builds params from already-decoded pairs (e.g. JSON share formats)
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            pairs: pairs.into_iter().filter(|(key, _)| !key.is_empty()).collect(),
        }
    }

    /// Removes every pair under `key` and returns the first non-empty value
    pub fn take(&mut self, key: &str) -> Option<String> {
        let mut found = None;
        self.pairs.retain(|(k, v)| {
            if k != key {
                return true;
            }
            if found.is_none() && !v.trim().is_empty() {
                found = Some(v.trim().to_string());
            }
            false
        });
        found
    }

    /// Takes every alias and returns the first one that had a value
    pub fn take_any(&mut self, keys: &[&str]) -> Option<String> {
        let mut found = None;
        for key in keys {
            let value = self.take(key);
            if found.is_none() {
                found = value;
            }
        }
        found
    }

    /// Takes a boolean flag; an unrecognized value logs and yields `None`
    pub fn take_flag(&mut self, keys: &[&str]) -> Option<bool> {
        let value = self.take_any(keys)?;
        let flag = parse_flag(&value);
        if flag.is_none() {
            let field = keys.first().copied().unwrap_or_default();
            warn!(field, value = %value, "Ignoring invalid boolean flag");
        }
        flag
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs not consumed by a decoder, first value per key
    pub fn into_remaining(self) -> Vec<(String, String)> {
        let mut remaining: Vec<(String, String)> = Vec::new();
        for (key, value) in self.pairs {
            if !remaining.iter().any(|(k, _)| *k == key) {
                remaining.push((key, value));
            }
        }
        remaining
    }
}
