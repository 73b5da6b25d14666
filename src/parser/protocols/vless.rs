//! VLESS share links
//!
//! Format: vless://uuid@host:port?type=ws&security=reality&pbk=...&flow=...#name

use std::collections::BTreeMap;

use tracing::trace;

use crate::node::{Credential, Protocol, ProxyNode, SecurityKind};
use crate::parser::codec::split_host_port;
use crate::parser::error::LinkError;
use crate::parser::link::LinkParts;

use super::{node_name, put_flag, put_value, retain_unknown, take_security, take_transport};

pub fn parse(uri: &str) -> Result<ProxyNode, LinkError> {
    trace!("Parsing VLESS URI");
    let parts = LinkParts::split(uri)?;

    let uuid = parts
        .decoded_userinfo()
        .ok_or_else(|| LinkError::parse(Protocol::Vless, "missing UUID"))?;
    let (server, port) = split_host_port(parts.authority)?;

    let LinkParts {
        mut query,
        fragment,
        ..
    } = parts;

    let transport = take_transport(&mut query, Protocol::Vless)?;
    let security = take_security(&mut query, Protocol::Vless, SecurityKind::None)?;

    let mut extra = BTreeMap::new();
    put_value(&mut extra, "flow", query.take("flow"));
    put_value(
        &mut extra,
        "packet-encoding",
        query.take_any(&["packetEncoding", "packet-encoding"]),
    );
    // encryption=none is the default and is not stored
    if let Some(encryption) = query.take("encryption")
        && !encryption.eq_ignore_ascii_case("none")
    {
        extra.insert("encryption".to_string(), encryption);
    }
    put_flag(&mut extra, "mux", query.take_flag(&["mux"]));
    retain_unknown(&mut extra, query);

    Ok(ProxyNode {
        name: node_name(fragment, Protocol::Vless, &server, port),
        protocol: Protocol::Vless,
        server,
        port,
        credential: Credential::Uuid(uuid),
        transport,
        security,
        extra,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::TransportKind;

    const UUID: &str = "b831381d-6324-4d53-ad4f-8cda48b30811";

    #[test]
    fn test_vless_reality_vision() {
        let uri = format!(
            "vless://{UUID}@example.com:443?encryption=none&flow=xtls-rprx-vision&security=reality&sni=www.microsoft.com&fp=chrome&pbk=PUBKEY&sid=6ba85179&type=tcp#Reality"
        );
        let node = parse(&uri).unwrap();
        assert_eq!(node.name, "Reality");
        assert_eq!(node.credential, Credential::Uuid(UUID.to_string()));
        assert_eq!(node.security.kind, SecurityKind::Reality);
        assert_eq!(node.security.sni.as_deref(), Some("www.microsoft.com"));
        assert_eq!(node.security.public_key.as_deref(), Some("PUBKEY"));
        assert_eq!(node.security.short_id.as_deref(), Some("6ba85179"));
        assert_eq!(node.extra("flow"), Some("xtls-rprx-vision"));
        assert!(node.extra("encryption").is_none());
        assert_eq!(node.transport.kind, TransportKind::Tcp);
    }

    #[test]
    fn test_vless_ws_tls() {
        let uri = format!(
            "vless://{UUID}@example.com:443?type=ws&security=tls&path=%2Fvless%3Fed%3D2048&host=cdn.example.com"
        );
        let node = parse(&uri).unwrap();
        assert_eq!(node.transport.kind, TransportKind::Ws);
        assert_eq!(node.transport.option("path"), Some("/vless?ed=2048"));
        assert_eq!(node.transport.option("host"), Some("cdn.example.com"));
        assert_eq!(node.security.kind, SecurityKind::Tls);
    }

    #[test]
    fn test_vless_at_sign_in_path() {
        let node = parse(&format!(
            "vless://{UUID}@h.example:443/ws@x?type=ws&security=tls#N"
        ))
        .unwrap();
        assert_eq!(node.server, "h.example");
        assert_eq!(node.port, 443);
        assert_eq!(node.credential, Credential::Uuid(UUID.to_string()));
    }

    #[test]
    fn test_vless_plain_defaults() {
        let node = parse(&format!("vless://{UUID}@10.0.0.1:8080")).unwrap();
        assert_eq!(node.security.kind, SecurityKind::None);
        assert_eq!(node.transport.kind, TransportKind::Tcp);
        assert_eq!(node.name, "vless-10.0.0.1:8080");
    }

    #[test]
    fn test_vless_h2_and_grpc() {
        let node = parse(&format!(
            "vless://{UUID}@h.example:443?type=h2&security=tls&path=/h2&host=a.com"
        ))
        .unwrap();
        assert_eq!(node.transport.kind, TransportKind::H2);

        let node = parse(&format!(
            "vless://{UUID}@h.example:443?type=grpc&security=tls&serviceName=grpc-svc&mode=multi"
        ))
        .unwrap();
        assert_eq!(node.transport.kind, TransportKind::Grpc);
        assert_eq!(node.transport.option("mode"), Some("multi"));
    }

    #[test]
    fn test_vless_packet_encoding_and_unknown() {
        let node = parse(&format!(
            "vless://{UUID}@h.example:443?packetEncoding=xudp&spx=%2F&custom=1"
        ))
        .unwrap();
        assert_eq!(node.extra("packet-encoding"), Some("xudp"));
        assert_eq!(node.extra("spx"), Some("/"));
        assert_eq!(node.extra("custom"), Some("1"));
    }

    #[test]
    fn test_vless_failures() {
        assert!(parse("vless://@h.example:443").is_err());
        assert!(parse(&format!("vless://{UUID}@h.example")).is_err());
        assert!(parse(&format!("vless://{UUID}@h.example:443?security=reality")).is_err());
        assert!(parse(&format!("vless://{UUID}@h.example:443?type=kcp")).is_err());
        assert!(parse(&format!("vless://{UUID}@h.example:443?security=magic")).is_err());
    }
}
