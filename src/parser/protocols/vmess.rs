//! VMess share links
//!
//! VMess links are Base64 encoded JSON:
//! vmess://BASE64({ "v": "2", "ps": "name", "add": "host", "port": 443, "id": "...", ... })

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{trace, warn};

use crate::node::{Credential, Protocol, ProxyNode, SecurityKind};
use crate::parser::codec::{decode_base64_text, parse_port};
use crate::parser::error::LinkError;
use crate::parser::link::QueryParams;

use super::{node_name, retain_unknown, take_security, take_transport};

/// Fixed fields of the JSON share format; everything else is routed
/// through the shared transport / TLS readers as if it were a query string
#[derive(Deserialize, Debug)]
struct VmessShare {
    #[serde(default, deserialize_with = "json_string")]
    ps: String,
    #[serde(default, deserialize_with = "json_string")]
    add: String,
    #[serde(default, deserialize_with = "json_string")]
    port: String,
    #[serde(default, deserialize_with = "json_string")]
    id: String,
    #[serde(default, deserialize_with = "json_string")]
    aid: String,
    #[serde(default, deserialize_with = "json_string")]
    scy: String,
    #[serde(flatten)]
    rest: BTreeMap<String, Value>,
}

pub fn parse(uri: &str) -> Result<ProxyNode, LinkError> {
    trace!("Parsing VMess URI");
    let payload = uri
        .trim()
        .split_once("://")
        .map(|(_, payload)| payload)
        .ok_or_else(|| LinkError::format("missing scheme separator ://"))?;
    // some exporters append a fragment to the base64 body
    let payload = payload.split('#').next().unwrap_or_default();

    let json = decode_base64_text(payload)?;
    let share: VmessShare = serde_json::from_str(&json)
        .map_err(|e| LinkError::decode(format!("invalid VMess JSON: {e}")))?;

    if share.add.is_empty() {
        return Err(LinkError::parse(Protocol::Vmess, "missing server address"));
    }
    if share.id.is_empty() {
        return Err(LinkError::parse(Protocol::Vmess, "missing UUID"));
    }
    let port = parse_port(&share.port)?;
    let server = share.add.trim_start_matches('[').trim_end_matches(']').to_string();

    let alter_id = if share.aid.is_empty() {
        0
    } else {
        share.aid.parse().unwrap_or_else(|_| {
            warn!(field = "aid", value = %share.aid, "Ignoring non-numeric alter id");
            0
        })
    };
    let cipher = if share.scy.is_empty() {
        "auto".to_string()
    } else {
        share.scy
    };

    let mut query = share_query(share.rest);
    let transport = take_transport(&mut query, Protocol::Vmess)?;
    let security = take_security(&mut query, Protocol::Vmess, SecurityKind::None)?;

    let mut extra = BTreeMap::new();
    retain_unknown(&mut extra, query);

    let fragment = Some(share.ps.trim().to_string()).filter(|ps| !ps.is_empty());
    Ok(ProxyNode {
        name: node_name(fragment, Protocol::Vmess, &server, port),
        protocol: Protocol::Vmess,
        server,
        port,
        credential: Credential::Vmess {
            uuid: share.id,
            alter_id,
            cipher,
        },
        transport,
        security,
        extra,
    })
}

/// Renames JSON keys to their query-string equivalents
fn share_query(rest: BTreeMap<String, Value>) -> QueryParams {
    let is_grpc = rest.get("net").and_then(Value::as_str) == Some("grpc");
    let has_service_name = rest.contains_key("serviceName");

    QueryParams::from_pairs(rest.into_iter().filter_map(|(key, value)| {
        let key = match key.as_str() {
            // share-format version
            "v" => return None,
            "net" => "type".to_string(),
            "type" => "headerType".to_string(),
            "tls" => "security".to_string(),
            // v2rayN stores the gRPC service name in `path`
            "path" if is_grpc && !has_service_name => "serviceName".to_string(),
            _ => key,
        };
        json_text(&value)
            .filter(|text| !text.is_empty())
            .map(|text| (key, text))
    }))
}

fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Accepts strings, numbers and null alike
fn json_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(json_text(&value).unwrap_or_default())
}
