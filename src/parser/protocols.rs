//! Protocol decoders
//!
//! One pure function per dialect, selected through a static scheme table.
//! Each decoder turns exactly one share link into a [`ProxyNode`] or fails
//! with a [`LinkError`].

mod hysteria;
mod hysteria2;
mod shadowsocks;
mod trojan;
mod tuic;
mod vless;
mod vmess;

use std::collections::BTreeMap;

use tracing::warn;

use crate::node::{Protocol, ProxyNode, Security, SecurityKind, Transport, TransportKind};

use super::codec::{parse_mbps, split_list};
use super::error::LinkError;
use super::link::QueryParams;

// ============================================================================
// Decoder Table
// ============================================================================

/// Signature shared by every protocol decoder
pub type DecodeFn = fn(&str) -> Result<ProxyNode, LinkError>;

/// Scheme to decoder lookup table
pub static DECODERS: &[(&str, DecodeFn)] = &[
    ("vless", vless::parse),
    ("vmess", vmess::parse),
    ("trojan", trojan::parse),
    ("ss", shadowsocks::parse),
    ("hysteria", hysteria::parse),
    ("hysteria2", hysteria2::parse),
    ("hy2", hysteria2::parse),
    ("tuic", tuic::parse),
];

/// Looks up the decoder for a lowercase scheme
pub fn decoder_for(scheme: &str) -> Option<DecodeFn> {
    DECODERS
        .iter()
        .find(|(name, _)| *name == scheme)
        .map(|(_, decode)| *decode)
}

/// All schemes with a registered decoder
pub fn supported_schemes() -> impl Iterator<Item = &'static str> {
    DECODERS.iter().map(|(name, _)| *name)
}

// ============================================================================
// Shared Decoder Helpers
// ============================================================================

/// Fragment if present, otherwise `<label>-<server>:<port>`
pub(crate) fn node_name(
    fragment: Option<String>,
    protocol: Protocol,
    server: &str,
    port: u16,
) -> String {
    fragment.unwrap_or_else(|| ProxyNode::default_name(protocol, server, port))
}

/// Reads `type`/`network` and the option keys that kind understands
///
/// Option keys irrelevant to the chosen kind stay in the query and end up as
/// unknown extras.
pub(crate) fn take_transport(
    query: &mut QueryParams,
    protocol: Protocol,
) -> Result<Transport, LinkError> {
    let kind_text = query
        .take_any(&["type", "network"])
        .unwrap_or_else(|| "tcp".to_string())
        .to_ascii_lowercase();
    let header_type = query.take("headerType").map(|h| h.to_ascii_lowercase());

    let kind = match kind_text.as_str() {
        "tcp" | "raw" if header_type.as_deref() == Some("http") => TransportKind::Http,
        "tcp" | "raw" => TransportKind::Tcp,
        "ws" | "websocket" => TransportKind::Ws,
        "http" => TransportKind::Http,
        "h2" => TransportKind::H2,
        "grpc" | "gun" => TransportKind::Grpc,
        other => {
            return Err(LinkError::parse(
                protocol,
                format!("unsupported transport '{other}'"),
            ));
        }
    };

    let mut transport = Transport::new(kind);
    let mut set = |key: &str, value: Option<String>| {
        if let Some(value) = value {
            transport.options.insert(key.to_string(), value);
        }
    };
    match kind {
        TransportKind::Ws | TransportKind::H2 => {
            set("path", query.take("path"));
            set("host", query.take("host"));
        }
        TransportKind::Http => {
            set("path", query.take("path"));
            set("host", query.take("host"));
            set("method", query.take("method"));
        }
        TransportKind::Grpc => {
            set("service-name", query.take_any(&["serviceName", "service-name"]));
            set("mode", query.take("mode"));
        }
        _ => {}
    }
    Ok(transport)
}

/// Reads `security` plus TLS / REALITY parameters for stream dialects
pub(crate) fn take_security(
    query: &mut QueryParams,
    protocol: Protocol,
    default: SecurityKind,
) -> Result<Security, LinkError> {
    let kind = match query.take("security").map(|s| s.to_ascii_lowercase()) {
        None => default,
        Some(value) => match value.as_str() {
            "none" => SecurityKind::None,
            "tls" | "xtls" => SecurityKind::Tls,
            "reality" => SecurityKind::Reality,
            other => {
                return Err(LinkError::parse(
                    protocol,
                    format!("unsupported security '{other}'"),
                ));
            }
        },
    };

    let mut security = take_tls_fields(query, &["sni", "serverName", "peer"]);
    security.kind = kind;

    if kind == SecurityKind::Reality {
        let public_key = query
            .take("pbk")
            .ok_or_else(|| LinkError::parse(protocol, "reality requires a public key (pbk)"))?;
        security.public_key = Some(public_key);
        security.short_id = query.take("sid");
    }
    Ok(security)
}

/// TLS parameters for QUIC dialects, which are always TLS
pub(crate) fn take_quic_tls(query: &mut QueryParams, sni_keys: &[&str]) -> Security {
    let mut security = take_tls_fields(query, sni_keys);
    security.kind = SecurityKind::Tls;
    security
}

fn take_tls_fields(query: &mut QueryParams, sni_keys: &[&str]) -> Security {
    Security {
        sni: query.take_any(sni_keys),
        fingerprint: query.take("fp"),
        alpn: query
            .take("alpn")
            .map(|alpn| split_list(&alpn))
            .filter(|alpn| !alpn.is_empty()),
        allow_insecure: query
            .take_flag(&["allowInsecure", "insecure", "allow_insecure", "skip-cert-verify"])
            .unwrap_or(false),
        ..Default::default()
    }
}

/// Stores a parsed flag as `"true"`/`"false"`
pub(crate) fn put_flag(extra: &mut BTreeMap<String, String>, key: &str, flag: Option<bool>) {
    if let Some(flag) = flag {
        extra.insert(key.to_string(), flag.to_string());
    }
}

/// Stores a non-empty string value
pub(crate) fn put_value(extra: &mut BTreeMap<String, String>, key: &str, value: Option<String>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        extra.insert(key.to_string(), value);
    }
}

/// Moves a plain integer (Mbps, seconds) into `extra`; anything else is dropped
pub(crate) fn take_integer(
    query: &mut QueryParams,
    keys: &[&str],
    extra: &mut BTreeMap<String, String>,
    key: &str,
) {
    let Some(value) = query.take_any(keys) else {
        return;
    };
    match parse_mbps(&value) {
        Some(mbps) => {
            extra.insert(key.to_string(), mbps.to_string());
        }
        None => warn!(field = key, value = %value, "Ignoring non-integer value"),
    }
}

/// Keeps every query key a decoder did not consume
pub(crate) fn retain_unknown(extra: &mut BTreeMap<String, String>, query: QueryParams) {
    for (key, value) in query.into_remaining() {
        extra.entry(key).or_insert(value);
    }
}
