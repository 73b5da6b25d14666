//! Hysteria (v1) share links
//!
//! Format: hysteria://[auth@]host:port?protocol=udp&auth=...&peer=...&upmbps=30&downmbps=200&obfs=...#name

use std::collections::BTreeMap;

use tracing::trace;

use crate::node::{Credential, Protocol, ProxyNode, Transport, TransportKind};
use crate::parser::codec::{parse_port, parse_port_hops, split_host};
use crate::parser::error::LinkError;
use crate::parser::link::LinkParts;

use super::{node_name, put_flag, put_value, retain_unknown, take_integer, take_quic_tls};

pub fn parse(uri: &str) -> Result<ProxyNode, LinkError> {
    trace!("Parsing Hysteria URI");
    let parts = LinkParts::split(uri)?;
    let userinfo = parts.decoded_userinfo();
    let (server, port_text) = split_host(parts.authority)?;

    let LinkParts {
        mut query,
        fragment,
        ..
    } = parts;

    let mut extra = BTreeMap::new();
    let port = quic_port(port_text, Protocol::Hysteria, &mut extra)?;
    if let Some(mport) = query.take("mport") {
        let hops = parse_port_hops(&mport)
            .map_err(|e| LinkError::parse(Protocol::Hysteria, format!("invalid mport: {e}")))?;
        extra.insert("ports".to_string(), hops);
    }

    let auth = query
        .take_any(&["auth", "auth_str", "auth-str"])
        .or(userinfo)
        .ok_or_else(|| LinkError::parse(Protocol::Hysteria, "missing auth string"))?;

    let kind = match query.take("protocol").map(|p| p.to_ascii_lowercase()) {
        None => TransportKind::Quic,
        Some(p) => match p.as_str() {
            "udp" => TransportKind::Quic,
            "faketcp" | "fake-tcp" => TransportKind::FakeTcp,
            "wechat-video" => TransportKind::WechatVideo,
            other => {
                return Err(LinkError::parse(
                    Protocol::Hysteria,
                    format!("unsupported protocol '{other}'"),
                ));
            }
        },
    };

    let security = take_quic_tls(&mut query, &["peer", "sni"]);
    take_integer(&mut query, &["upmbps", "up"], &mut extra, "up");
    take_integer(&mut query, &["downmbps", "down"], &mut extra, "down");
    put_value(&mut extra, "obfs", query.take_any(&["obfs", "obfsParam"]));
    put_flag(&mut extra, "fast-open", query.take_flag(&["fastopen", "fast-open"]));
    retain_unknown(&mut extra, query);

    Ok(ProxyNode {
        name: node_name(fragment, Protocol::Hysteria, &server, port),
        protocol: Protocol::Hysteria,
        server,
        port,
        credential: Credential::Password(auth),
        transport: Transport::new(kind),
        security,
        extra,
    })
}

/// Authority port for QUIC dialects: a single port, or a hop list whose first
/// port becomes the node port
pub(crate) fn quic_port(
    port_text: &str,
    protocol: Protocol,
    extra: &mut BTreeMap<String, String>,
) -> Result<u16, LinkError> {
    if !port_text.contains([',', '-']) {
        return parse_port(port_text);
    }
    let hops = parse_port_hops(port_text)
        .map_err(|e| LinkError::parse(protocol, format!("invalid port list: {e}")))?;
    let first = hops
        .split([',', '-'])
        .next()
        .map(parse_port)
        .transpose()?
        .ok_or_else(|| LinkError::parse(protocol, "empty port list"))?;
    extra.insert("ports".to_string(), hops);
    Ok(first)
}
