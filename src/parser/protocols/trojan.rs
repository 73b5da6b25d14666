//! Trojan share links
//!
//! Format: trojan://password@host:port?params#name

use std::collections::BTreeMap;

use tracing::trace;

use crate::node::{Credential, Protocol, ProxyNode, SecurityKind, TransportKind};
use crate::parser::codec::split_host_port;
use crate::parser::error::LinkError;
use crate::parser::link::LinkParts;

use super::{node_name, put_flag, retain_unknown, take_security, take_transport};

pub fn parse(uri: &str) -> Result<ProxyNode, LinkError> {
    trace!("Parsing Trojan URI");
    let parts = LinkParts::split(uri)?;

    let password = parts
        .decoded_userinfo()
        .ok_or_else(|| LinkError::parse(Protocol::Trojan, "missing password"))?;
    let (server, port) = split_host_port(parts.authority)?;

    let LinkParts {
        mut query,
        fragment,
        ..
    } = parts;

    let transport = take_transport(&mut query, Protocol::Trojan)?;
    if !matches!(
        transport.kind,
        TransportKind::Tcp | TransportKind::Ws | TransportKind::Grpc
    ) {
        return Err(LinkError::parse(
            Protocol::Trojan,
            format!("transport '{}' is not available", transport.kind.as_str()),
        ));
    }

    let security = take_security(&mut query, Protocol::Trojan, SecurityKind::Tls)?;
    if security.kind == SecurityKind::None {
        return Err(LinkError::parse(Protocol::Trojan, "TLS cannot be disabled"));
    }

    let mut extra = BTreeMap::new();
    put_flag(&mut extra, "mux", query.take_flag(&["mux"]));
    retain_unknown(&mut extra, query);

    Ok(ProxyNode {
        name: node_name(fragment, Protocol::Trojan, &server, port),
        protocol: Protocol::Trojan,
        server,
        port,
        credential: Credential::Password(password),
        transport,
        security,
        extra,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trojan_basic() {
        let node = parse("trojan://secret@host.example:443#My-Node").unwrap();
        assert_eq!(node.name, "My-Node");
        assert_eq!(node.server, "host.example");
        assert_eq!(node.port, 443);
        assert_eq!(node.credential, Credential::Password("secret".to_string()));
        assert_eq!(node.security.kind, SecurityKind::Tls);
        assert_eq!(node.transport.kind, TransportKind::Tcp);
        assert!(node.extra.is_empty());
    }

    #[test]
    fn test_trojan_with_websocket() {
        let node = parse(
            "trojan://pw@example.com:443?type=ws&path=%2Fws&host=cdn.example.com&sni=example.com#ws",
        )
        .unwrap();
        assert_eq!(node.transport.kind, TransportKind::Ws);
        assert_eq!(node.transport.option("path"), Some("/ws"));
        assert_eq!(node.transport.option("host"), Some("cdn.example.com"));
        assert_eq!(node.security.sni.as_deref(), Some("example.com"));
    }

    #[test]
    fn test_trojan_with_grpc_and_fingerprint() {
        let node =
            parse("trojan://pw@example.com:443?type=grpc&serviceName=svc&fp=firefox&alpn=h2").unwrap();
        assert_eq!(node.transport.kind, TransportKind::Grpc);
        assert_eq!(node.transport.option("service-name"), Some("svc"));
        assert_eq!(node.security.fingerprint.as_deref(), Some("firefox"));
        assert_eq!(node.security.alpn, Some(vec!["h2".to_string()]));
    }

    #[test]
    fn test_trojan_peer_alias_and_insecure() {
        let node = parse("trojan://pw@1.2.3.4:443?peer=real.example&allowInsecure=1").unwrap();
        assert_eq!(node.security.sni.as_deref(), Some("real.example"));
        assert!(node.security.allow_insecure);
    }

    #[test]
    fn test_trojan_mux_flag() {
        let node = parse("trojan://pw@h.example:443?mux=TRUE").unwrap();
        assert!(node.extra_flag("mux"));
    }

    #[test]
    fn test_trojan_invalid_flag_falls_back() {
        let node = parse("trojan://pw@h.example:443?allowInsecure=maybe").unwrap();
        assert!(!node.security.allow_insecure);
    }

    #[test]
    fn test_trojan_no_tag() {
        let node = parse("trojan://pw@h.example:8443").unwrap();
        assert_eq!(node.name, "trojan-h.example:8443");
    }

    #[test]
    fn test_trojan_url_encoded_password_and_tag() {
        let node = parse("trojan://p%40ss%3Aword@h.example:443#Hong%20Kong%2001").unwrap();
        assert_eq!(node.credential, Credential::Password("p@ss:word".to_string()));
        assert_eq!(node.name, "Hong Kong 01");
    }

    #[test]
    fn test_trojan_ipv6_host() {
        let node = parse("trojan://pw@[2001:db8::1]:443").unwrap();
        assert_eq!(node.server, "2001:db8::1");
        assert_eq!(node.port, 443);
    }

    #[test]
    fn test_trojan_unknown_keys_retained() {
        let node = parse("trojan://pw@h.example:443?plugin-extra=abc").unwrap();
        assert_eq!(node.extra("plugin-extra"), Some("abc"));
    }

    #[test]
    fn test_trojan_missing_password() {
        assert!(matches!(
            parse("trojan://@h.example:443"),
            Err(LinkError::Parse { .. })
        ));
        assert!(parse("trojan://h.example:443").is_err());
    }

    #[test]
    fn test_trojan_bad_port() {
        assert!(matches!(
            parse("trojan://pw@h.example:99999"),
            Err(LinkError::Format(_))
        ));
        assert!(parse("trojan://pw@h.example").is_err());
    }

    #[test]
    fn test_trojan_rejects_tls_off_and_h2() {
        assert!(parse("trojan://pw@h.example:443?security=none").is_err());
        assert!(parse("trojan://pw@h.example:443?type=h2").is_err());
    }
}
