//! Shadowsocks share links, including the 2022 (BLAKE3) methods
//!
//! Supported formats:
//! - SIP002: ss://BASE64(method:password)@host:port?plugin=...#name
//! - SIP002 plain: ss://method:password@host:port#name
//! - Legacy: ss://BASE64(method:password@host:port)#name

use std::collections::BTreeMap;

use tracing::{trace, warn};

use crate::node::{Credential, Protocol, ProxyNode, Security, Transport};
use crate::parser::codec::{decode_base64, decode_base64_text, decode_percent, split_host_port};
use crate::parser::error::LinkError;
use crate::parser::link::{LinkParts, QueryParams};

use super::{node_name, put_flag, retain_unknown};

/// 2022 methods and their exact key length in bytes
const SS2022_METHODS: &[(&str, usize)] = &[
    ("2022-blake3-aes-128-gcm", 16),
    ("2022-blake3-aes-256-gcm", 32),
    ("2022-blake3-chacha20-poly1305", 32),
];

pub fn parse(uri: &str) -> Result<ProxyNode, LinkError> {
    trace!("Parsing Shadowsocks URI");
    let parts = LinkParts::split(uri)?;

    let (method, secret, server, port) = match parts.userinfo {
        Some(userinfo) => {
            let (method, secret) = parse_userinfo(userinfo)?;
            let (server, port) = split_host_port(parts.authority)?;
            (method, secret, server, port)
        }
        None => parse_legacy(parts.body)?,
    };

    let method = method.trim().to_ascii_lowercase();
    if method.is_empty() {
        return Err(LinkError::parse(Protocol::Shadowsocks, "missing method"));
    }
    if secret.is_empty() {
        return Err(LinkError::parse(Protocol::Shadowsocks, "missing password"));
    }

    let protocol = if method.starts_with("2022-") {
        check_2022_key(&method, &secret)?;
        Protocol::Shadowsocks2022
    } else {
        Protocol::Shadowsocks
    };

    let LinkParts {
        mut query,
        fragment,
        ..
    } = parts;

    let mut extra = BTreeMap::new();
    take_plugin(&mut query, &mut extra);
    put_flag(
        &mut extra,
        "udp-over-tcp",
        query.take_flag(&["uot", "udp-over-tcp"]),
    );
    put_flag(&mut extra, "mux", query.take_flag(&["mux"]));
    retain_unknown(&mut extra, query);

    Ok(ProxyNode {
        name: node_name(fragment, protocol, &server, port),
        protocol,
        server,
        port,
        credential: Credential::Cipher { method, secret },
        transport: Transport::default(),
        security: Security::default(),
        extra,
    })
}

/// Userinfo is either `BASE64(method:password)` or `method:password`
///
/// Base64 wins when it decodes to text containing a colon; otherwise the raw
/// text is split on its first unescaped colon and each half percent-decoded.
fn parse_userinfo(userinfo: &str) -> Result<(String, String), LinkError> {
    if let Ok(decoded) = decode_base64_text(&decode_percent(userinfo))
        && let Some((method, password)) = decoded.split_once(':')
    {
        return Ok((method.to_string(), password.to_string()));
    }

    let (method, password) = userinfo.split_once(':').ok_or_else(|| {
        LinkError::parse(
            Protocol::Shadowsocks,
            "userinfo is neither base64 nor method:password",
        )
    })?;
    Ok((decode_percent(method), decode_percent(password)))
}

/// Legacy whole-body format: BASE64(method:password@host:port)
fn parse_legacy(body: &str) -> Result<(String, String, String, u16), LinkError> {
    let decoded = decode_base64_text(&decode_percent(body.trim_end_matches('/')))?;

    let (userinfo, authority) = decoded.rsplit_once('@').ok_or_else(|| {
        LinkError::parse(Protocol::Shadowsocks, "legacy payload missing '@'")
    })?;
    let (method, password) = userinfo.split_once(':').ok_or_else(|| {
        LinkError::parse(Protocol::Shadowsocks, "legacy payload missing method:password")
    })?;
    let (server, port) = split_host_port(authority)?;

    Ok((method.to_string(), password.to_string(), server, port))
}

/// Each `:`-separated PSK must decode to exactly the method's key size
fn check_2022_key(method: &str, secret: &str) -> Result<(), LinkError> {
    let key_len = SS2022_METHODS
        .iter()
        .find(|(name, _)| *name == method)
        .map(|(_, len)| *len)
        .ok_or_else(|| {
            LinkError::parse(
                Protocol::Shadowsocks2022,
                format!("unrecognized method '{method}'"),
            )
        })?;

    for psk in secret.split(':') {
        let decoded = decode_base64(psk).map_err(|_| {
            LinkError::parse(Protocol::Shadowsocks2022, "key is not valid base64")
        })?;
        if decoded.len() != key_len {
            return Err(LinkError::parse(
                Protocol::Shadowsocks2022,
                format!(
                    "{method} needs a {key_len}-byte key, got {} bytes",
                    decoded.len()
                ),
            ));
        }
    }
    Ok(())
}

/// SIP003 `plugin=name;opt=value;flag`
fn take_plugin(query: &mut QueryParams, extra: &mut BTreeMap<String, String>) {
    let Some(value) = query.take("plugin") else {
        return;
    };
    let (name, opts) = match value.split_once(';') {
        Some((name, opts)) => (name.trim(), opts.trim()),
        None => (value.trim(), ""),
    };
    extra.insert("plugin".to_string(), normalize_plugin(name));
    if !opts.is_empty() {
        extra.insert("plugin-opts".to_string(), opts.to_string());
    }
}

/// Maps SIP003 client names onto the names the config format expects
fn normalize_plugin(name: &str) -> String {
    match name {
        "simple-obfs" | "obfs-local" => "obfs".to_string(),
        "obfs" | "v2ray-plugin" | "gost-plugin" | "shadow-tls" | "restls" => name.to_string(),
        other => {
            warn!(plugin = other, "Unknown SIP003 plugin kept as-is");
            other.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    fn cipher(node: &ProxyNode) -> (&str, &str) {
        let Credential::Cipher { method, secret } = &node.credential else {
            panic!("Expected cipher credential");
        };
        (method, secret)
    }

    #[test]
    fn test_shadowsocks_sip002_base64_userinfo() {
        let node = parse("ss://YWVzLTI1Ni1nY206cEBzcw==@1.2.3.4:8388#Test").unwrap();
        assert_eq!(node.protocol, Protocol::Shadowsocks);
        assert_eq!(cipher(&node), ("aes-256-gcm", "p@ss"));
        assert_eq!(node.server, "1.2.3.4");
        assert_eq!(node.port, 8388);
        assert_eq!(node.name, "Test");
    }

    #[test]
    fn test_shadowsocks_unpadded_base64_userinfo() {
        let node = parse("ss://YWVzLTI1Ni1nY206cEBzcw@1.2.3.4:8388").unwrap();
        assert_eq!(cipher(&node), ("aes-256-gcm", "p@ss"));
        assert_eq!(node.name, "ss-1.2.3.4:8388");
    }

    #[test]
    fn test_shadowsocks_plain_userinfo() {
        let node = parse("ss://chacha20-ietf-poly1305:pa%3Ass@h.example:443").unwrap();
        assert_eq!(cipher(&node), ("chacha20-ietf-poly1305", "pa:ss"));
    }

    #[test]
    fn test_shadowsocks_legacy_format() {
        let encoded = STANDARD.encode("aes-128-gcm:test@192.168.100.1:8888");
        let node = parse(&format!("ss://{encoded}#Example")).unwrap();
        assert_eq!(cipher(&node), ("aes-128-gcm", "test"));
        assert_eq!(node.server, "192.168.100.1");
        assert_eq!(node.port, 8888);
        assert_eq!(node.name, "Example");
    }

    #[test]
    fn test_shadowsocks_sip003_obfs_plugin() {
        let node = parse(
            "ss://YWVzLTI1Ni1nY206cEBzcw@h.example:8388/?plugin=simple-obfs%3Bobfs%3Dhttp%3Bobfs-host%3Dwww.bing.com#obfs",
        )
        .unwrap();
        assert_eq!(node.extra("plugin"), Some("obfs"));
        assert_eq!(
            node.extra("plugin-opts"),
            Some("obfs=http;obfs-host=www.bing.com")
        );
    }

    #[test]
    fn test_shadowsocks_plugin_name_only_and_uot() {
        let node = parse("ss://aes-256-gcm:pw@h.example:8388?plugin=v2ray-plugin&uot=1").unwrap();
        assert_eq!(node.extra("plugin"), Some("v2ray-plugin"));
        assert!(node.extra("plugin-opts").is_none());
        assert!(node.extra_flag("udp-over-tcp"));
    }

    #[test]
    fn test_shadowsocks_2022_valid() {
        let key = STANDARD.encode([7u8; 32]);
        let node = parse(&format!("ss://2022-blake3-aes-256-gcm:{key}@h.example:443")).unwrap();
        assert_eq!(node.protocol, Protocol::Shadowsocks2022);
        assert_eq!(node.name, "ss2022-h.example:443");
    }

    #[test]
    fn test_shadowsocks_2022_base64_userinfo() {
        let key = STANDARD.encode([1u8; 16]);
        let userinfo = STANDARD.encode(format!("2022-blake3-aes-128-gcm:{key}"));
        let node = parse(&format!("ss://{userinfo}@h.example:443")).unwrap();
        assert_eq!(node.protocol, Protocol::Shadowsocks2022);
        assert_eq!(cipher(&node).1, key);
    }

    #[test]
    fn test_shadowsocks_2022_multi_user_keys() {
        let server_key = STANDARD.encode([2u8; 32]);
        let user_key = STANDARD.encode([3u8; 32]);
        let link = format!("ss://2022-blake3-aes-256-gcm:{server_key}:{user_key}@h.example:443");
        assert!(parse(&link).is_ok());

        let short_user = STANDARD.encode([3u8; 16]);
        let link = format!("ss://2022-blake3-aes-256-gcm:{server_key}:{short_user}@h.example:443");
        assert!(parse(&link).is_err());
    }

    #[test]
    fn test_shadowsocks_2022_rejects_short_key() {
        let key = STANDARD.encode([7u8; 16]);
        let err = parse(&format!("ss://2022-blake3-aes-256-gcm:{key}@h.example:443")).unwrap_err();
        assert!(matches!(err, LinkError::Parse { ref protocol, .. } if protocol == "ss2022"));
    }

    #[test]
    fn test_shadowsocks_2022_rejects_plain_password() {
        assert!(parse("ss://2022-blake3-aes-128-gcm:hunter2@h.example:443").is_err());
    }

    #[test]
    fn test_shadowsocks_2022_rejects_unknown_method() {
        let key = STANDARD.encode([7u8; 32]);
        assert!(parse(&format!("ss://2022-blake3-foo:{key}@h.example:443")).is_err());
    }

    #[test]
    fn test_shadowsocks_ipv6_host() {
        let node = parse("ss://YWVzLTI1Ni1nY206cEBzcw@[::1]:8388").unwrap();
        assert_eq!(node.server, "::1");
    }

    #[test]
    fn test_shadowsocks_failures() {
        assert!(parse("ss://not-valid").is_err());
        assert!(parse("ss://nocolon@h.example:443").is_err());
        assert!(parse("ss://aes-256-gcm:@h.example:443").is_err());
        assert!(parse("ss://:pw@h.example:443").is_err());
    }
}
