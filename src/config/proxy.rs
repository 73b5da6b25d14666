//! Mihomo `proxies` entries
//!
//! [`MihomoProxy`] is the rendered form of one [`ProxyNode`]. Its field order
//! is the serialized key order, and every optional field is skipped when
//! unset, so equal nodes always render to identical YAML.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_yaml::Value;
use tracing::debug;

use crate::node::{Credential, Protocol, ProxyNode, SecurityKind, TransportKind};

use super::util::{comma_list, flag, mbps};

// ============================================================================
// Nested Option Blocks
// ============================================================================

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct RealityOpts {
    pub public_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_id: Option<String>,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct WsOpts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct HttpOpts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    pub path: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Vec<String>>,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct H2Opts {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub host: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub struct GrpcOpts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grpc_service_name: Option<String>,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Smux {
    pub enabled: bool,
}

// ============================================================================
// MihomoProxy
// ============================================================================

/// One rendered `proxies` entry
#[derive(Serialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub struct MihomoProxy {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub server: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ports: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hop_interval: Option<u32>,

    // Credentials
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(rename = "alterId", skip_serializing_if = "Option::is_none")]
    pub alter_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cipher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_str: Option<String>,

    pub udp: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub udp_over_tcp: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin_opts: Option<BTreeMap<String, Value>>,

    // Transport and TLS
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servername: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sni: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpn: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_cert_verify: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reality_opts: Option<RealityOpts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ws_opts: Option<WsOpts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_opts: Option<HttpOpts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h2_opts: Option<H2Opts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grpc_opts: Option<GrpcOpts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packet_encoding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption: Option<String>,

    // QUIC dialects
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub up: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub down: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obfs: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obfs_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fast_open: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub congestion_controller: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub udp_relay_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reduce_rtt: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_sni: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub smux: Option<Smux>,

    /// Unrecognized link parameters, emitted after the known fields
    #[serde(flatten)]
    pub passthrough: BTreeMap<String, String>,
}

/// Every key [`MihomoProxy`] can emit itself; passthrough never overrides these
const EMITTED_KEYS: &[&str] = &[
    "name",
    "type",
    "server",
    "port",
    "ports",
    "hop-interval",
    "uuid",
    "alterId",
    "cipher",
    "password",
    "auth-str",
    "udp",
    "udp-over-tcp",
    "plugin",
    "plugin-opts",
    "network",
    "tls",
    "flow",
    "servername",
    "sni",
    "alpn",
    "skip-cert-verify",
    "client-fingerprint",
    "reality-opts",
    "ws-opts",
    "http-opts",
    "h2-opts",
    "grpc-opts",
    "packet-encoding",
    "encryption",
    "protocol",
    "up",
    "down",
    "obfs",
    "obfs-password",
    "fast-open",
    "congestion-controller",
    "udp-relay-mode",
    "reduce-rtt",
    "disable-sni",
    "smux",
];

/// `extra` keys each dialect's renderer consumes; anything else is unknown
pub fn known_extras(protocol: Protocol) -> &'static [&'static str] {
    match protocol {
        Protocol::Vless => &["flow", "packet-encoding", "encryption", "mux"],
        Protocol::Vmess => &[],
        Protocol::Trojan => &["mux"],
        Protocol::Shadowsocks | Protocol::Shadowsocks2022 => {
            &["plugin", "plugin-opts", "udp-over-tcp", "mux"]
        }
        Protocol::Hysteria => &["up", "down", "obfs", "ports", "fast-open"],
        Protocol::Hysteria2 => &["up", "down", "obfs", "obfs-password", "ports", "hop-interval"],
        Protocol::Tuic => &[
            "congestion-control",
            "udp-relay-mode",
            "reduce-rtt",
            "disable-sni",
        ],
    }
}

/// Mihomo `type` value for a dialect
pub fn mihomo_type(protocol: Protocol) -> &'static str {
    match protocol {
        Protocol::Vless => "vless",
        Protocol::Vmess => "vmess",
        Protocol::Trojan => "trojan",
        Protocol::Shadowsocks | Protocol::Shadowsocks2022 => "ss",
        Protocol::Hysteria => "hysteria",
        Protocol::Hysteria2 => "hysteria2",
        Protocol::Tuic => "tuic",
    }
}

impl MihomoProxy {
    /// Renders a node with the field names Mihomo uses for its dialect
    pub fn from_node(node: &ProxyNode, passthrough: bool) -> Self {
        let mut proxy = MihomoProxy {
            name: node.name.clone(),
            kind: mihomo_type(node.protocol),
            server: node.server.clone(),
            port: node.port,
            udp: true,
            ..Default::default()
        };

        proxy.apply_credential(&node.credential);

        match node.protocol {
            Protocol::Vless => {
                proxy.apply_stream(node);
                proxy.apply_tls(node, TlsStyle::Servername);
                proxy.flow = extra_string(node, "flow");
                proxy.packet_encoding = extra_string(node, "packet-encoding");
                proxy.encryption = extra_string(node, "encryption");
                proxy.apply_smux(node);
            }
            Protocol::Vmess => {
                proxy.apply_stream(node);
                proxy.apply_tls(node, TlsStyle::Servername);
            }
            Protocol::Trojan => {
                proxy.apply_stream(node);
                proxy.apply_tls(node, TlsStyle::Sni);
                proxy.apply_smux(node);
            }
            Protocol::Shadowsocks | Protocol::Shadowsocks2022 => {
                proxy.udp_over_tcp = flag(node.extra("udp-over-tcp"));
                if let Some(plugin) = node.extra("plugin") {
                    proxy.plugin = Some(plugin.to_string());
                    proxy.plugin_opts = node
                        .extra("plugin-opts")
                        .map(|raw| plugin_opts(plugin, raw))
                        .filter(|opts| !opts.is_empty());
                }
                proxy.apply_smux(node);
            }
            Protocol::Hysteria => {
                proxy.apply_tls(node, TlsStyle::Quic);
                proxy.protocol = Some(match node.transport.kind {
                    TransportKind::FakeTcp => "faketcp",
                    TransportKind::WechatVideo => "wechat-video",
                    _ => "udp",
                });
                proxy.ports = extra_string(node, "ports");
                proxy.up = node.extra("up").map(mbps);
                proxy.down = node.extra("down").map(mbps);
                proxy.obfs = extra_string(node, "obfs");
                proxy.fast_open = flag(node.extra("fast-open"));
            }
            Protocol::Hysteria2 => {
                proxy.apply_tls(node, TlsStyle::Quic);
                proxy.ports = extra_string(node, "ports");
                proxy.hop_interval = node.extra("hop-interval").and_then(|v| v.parse().ok());
                proxy.up = node.extra("up").map(mbps);
                proxy.down = node.extra("down").map(mbps);
                proxy.obfs = extra_string(node, "obfs");
                if proxy.obfs.is_some() {
                    proxy.obfs_password = extra_string(node, "obfs-password");
                }
            }
            Protocol::Tuic => {
                proxy.apply_tls(node, TlsStyle::Quic);
                proxy.congestion_controller = extra_string(node, "congestion-control");
                proxy.udp_relay_mode = extra_string(node, "udp-relay-mode");
                proxy.reduce_rtt = flag(node.extra("reduce-rtt"));
                proxy.disable_sni = flag(node.extra("disable-sni"));
            }
        }

        if passthrough {
            proxy.passthrough = unknown_extras(node);
        }
        proxy
    }

    fn apply_credential(&mut self, credential: &Credential) {
        match credential {
            Credential::Uuid(uuid) => self.uuid = Some(uuid.clone()),
            Credential::Vmess {
                uuid,
                alter_id,
                cipher,
            } => {
                self.uuid = Some(uuid.clone());
                self.alter_id = Some(*alter_id);
                self.cipher = Some(cipher.clone());
            }
            Credential::Password(secret) if self.kind == "hysteria" => {
                self.auth_str = Some(secret.clone());
            }
            Credential::Password(secret) => self.password = Some(secret.clone()),
            Credential::Cipher { method, secret } => {
                self.cipher = Some(method.clone());
                self.password = Some(secret.clone());
            }
            Credential::UuidPassword { uuid, password } => {
                self.uuid = Some(uuid.clone());
                self.password = Some(password.clone());
            }
        }
    }

    /// `network` plus its `*-opts` block; plain TCP emits nothing
    fn apply_stream(&mut self, node: &ProxyNode) {
        let transport = &node.transport;
        let path = transport.option("path").map(str::to_string);
        let hosts = transport.option("host").map(comma_list).unwrap_or_default();

        match transport.kind {
            TransportKind::Ws => {
                self.network = Some("ws");
                let mut headers = BTreeMap::new();
                if let Some(host) = hosts.first() {
                    headers.insert("Host".to_string(), host.clone());
                }
                self.ws_opts = Some(WsOpts { path, headers });
            }
            TransportKind::Http => {
                self.network = Some("http");
                let mut headers = BTreeMap::new();
                if !hosts.is_empty() {
                    headers.insert("Host".to_string(), hosts);
                }
                self.http_opts = Some(HttpOpts {
                    method: transport.option("method").map(str::to_string),
                    path: vec![path.unwrap_or_else(|| "/".to_string())],
                    headers,
                });
            }
            TransportKind::H2 => {
                self.network = Some("h2");
                self.h2_opts = Some(H2Opts { host: hosts, path });
            }
            TransportKind::Grpc => {
                self.network = Some("grpc");
                self.grpc_opts = Some(GrpcOpts {
                    grpc_service_name: transport.option("service-name").map(str::to_string),
                });
            }
            TransportKind::Tcp
            | TransportKind::Quic
            | TransportKind::FakeTcp
            | TransportKind::WechatVideo => {}
        }
    }

    fn apply_tls(&mut self, node: &ProxyNode, style: TlsStyle) {
        let security = &node.security;
        if !security.is_enabled() {
            return;
        }

        match style {
            TlsStyle::Servername => {
                self.tls = Some(true);
                self.servername = security.sni.clone();
            }
            TlsStyle::Sni | TlsStyle::Quic => self.sni = security.sni.clone(),
        }
        self.alpn = security.alpn.clone();
        self.skip_cert_verify = security.allow_insecure.then_some(true);

        if style != TlsStyle::Quic {
            self.client_fingerprint = security.fingerprint.clone();
        }
        if security.kind == SecurityKind::Reality
            && let Some(public_key) = &security.public_key
        {
            self.reality_opts = Some(RealityOpts {
                public_key: public_key.clone(),
                short_id: security.short_id.clone(),
            });
        }
    }

    fn apply_smux(&mut self, node: &ProxyNode) {
        if node.extra_flag("mux") {
            self.smux = Some(Smux { enabled: true });
        }
    }
}

/// How a dialect spells its TLS fields
#[derive(Clone, Copy, PartialEq, Eq)]
enum TlsStyle {
    /// `tls: true` + `servername` (vless, vmess)
    Servername,
    /// `sni` (trojan)
    Sni,
    /// `sni`, always TLS, no uTLS fingerprint
    Quic,
}

fn extra_string(node: &ProxyNode, key: &str) -> Option<String> {
    node.extra(key).map(str::to_string)
}

/// `extra` entries the renderer does not consume and that do not shadow an emitted key
pub fn unknown_extras(node: &ProxyNode) -> BTreeMap<String, String> {
    let known = known_extras(node.protocol);
    node.extra
        .iter()
        .filter(|(key, _)| !known.contains(&key.as_str()))
        .filter(|(key, _)| {
            let shadowed = EMITTED_KEYS.contains(&key.as_str());
            if shadowed {
                debug!(node = %node.name, key = %key, "Dropping unknown field that shadows a known key");
            }
            !shadowed
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

// ============================================================================
// SIP003 Plugin Options
// ============================================================================

/// Converts `k=v;flag` plugin options into Mihomo's `plugin-opts` mapping
pub fn plugin_opts(plugin: &str, raw: &str) -> BTreeMap<String, Value> {
    let mut opts = BTreeMap::new();

    for part in raw.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = match part.split_once('=') {
            Some((key, value)) => (key.trim(), Some(value.trim())),
            None => (part, None),
        };

        let key = match (plugin, key) {
            ("obfs", "obfs") => "mode",
            ("obfs", "obfs-host") => "host",
            _ => key,
        };

        let value = match value {
            None => Value::Bool(true),
            Some(v) if v.eq_ignore_ascii_case("true") => Value::Bool(true),
            Some(v) if v.eq_ignore_ascii_case("false") => Value::Bool(false),
            Some(v) if key == "mux" && (v == "1" || v == "0") => Value::Bool(v == "1"),
            Some(v) if key == "version" => v
                .parse::<u64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(v.to_string())),
            Some(v) => Value::String(v.to_string()),
        };
        opts.insert(key.to_string(), value);
    }

    opts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Security, Transport};
    use pretty_assertions::assert_eq;

    fn node(protocol: Protocol, credential: Credential) -> ProxyNode {
        ProxyNode {
            name: "n".to_string(),
            protocol,
            server: "h.example".to_string(),
            port: 443,
            credential,
            transport: Transport::default(),
            security: Security::default(),
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn test_trojan_minimal_yaml() {
        let mut trojan = node(Protocol::Trojan, Credential::Password("pw".to_string()));
        trojan.security = Security::tls();
        let yaml = serde_yaml::to_string(&MihomoProxy::from_node(&trojan, false)).unwrap();
        assert_eq!(
            yaml,
            "name: n\ntype: trojan\nserver: h.example\nport: 443\npassword: pw\nudp: true\n"
        );
    }

    #[test]
    fn test_vless_reality_ws_yaml() {
        let mut vless = node(Protocol::Vless, Credential::Uuid("id".to_string()));
        vless.transport = Transport::new(TransportKind::Ws);
        vless
            .transport
            .options
            .insert("path".to_string(), "/ws".to_string());
        vless
            .transport
            .options
            .insert("host".to_string(), "cdn.example".to_string());
        vless.security = Security {
            kind: SecurityKind::Reality,
            sni: Some("real.example".to_string()),
            fingerprint: Some("chrome".to_string()),
            public_key: Some("PBK".to_string()),
            short_id: Some("ab".to_string()),
            ..Default::default()
        };
        vless
            .extra
            .insert("flow".to_string(), "xtls-rprx-vision".to_string());

        let yaml = serde_yaml::to_string(&MihomoProxy::from_node(&vless, false)).unwrap();
        assert_eq!(
            yaml,
            "name: n\ntype: vless\nserver: h.example\nport: 443\nuuid: id\nudp: true\nnetwork: ws\ntls: true\nflow: xtls-rprx-vision\nservername: real.example\nclient-fingerprint: chrome\nreality-opts:\n  public-key: PBK\n  short-id: ab\nws-opts:\n  path: /ws\n  headers:\n    Host: cdn.example\n"
        );
    }

    #[test]
    fn test_vmess_fields() {
        let vmess = node(
            Protocol::Vmess,
            Credential::Vmess {
                uuid: "id".to_string(),
                alter_id: 0,
                cipher: "auto".to_string(),
            },
        );
        let proxy = MihomoProxy::from_node(&vmess, false);
        assert_eq!(proxy.alter_id, Some(0));
        assert_eq!(proxy.cipher.as_deref(), Some("auto"));
        assert_eq!(proxy.tls, None);
        let yaml = serde_yaml::to_string(&proxy).unwrap();
        assert!(yaml.contains("alterId: 0\n"));
    }

    #[test]
    fn test_hysteria_fields() {
        let mut hy = node(Protocol::Hysteria, Credential::Password("auth".to_string()));
        hy.transport = Transport::new(TransportKind::FakeTcp);
        hy.security = Security::tls();
        hy.extra.insert("up".to_string(), "30".to_string());
        hy.extra.insert("down".to_string(), "200".to_string());
        let proxy = MihomoProxy::from_node(&hy, false);
        assert_eq!(proxy.auth_str.as_deref(), Some("auth"));
        assert_eq!(proxy.password, None);
        assert_eq!(proxy.protocol, Some("faketcp"));
        assert_eq!(proxy.up.as_deref(), Some("30 Mbps"));
        assert_eq!(proxy.down.as_deref(), Some("200 Mbps"));
    }

    #[test]
    fn test_hysteria2_ports_and_interval() {
        let mut hy2 = node(Protocol::Hysteria2, Credential::Password("pw".to_string()));
        hy2.security = Security::tls();
        hy2.extra
            .insert("ports".to_string(), "443,20000-30000".to_string());
        hy2.extra.insert("hop-interval".to_string(), "30".to_string());
        let yaml = serde_yaml::to_string(&MihomoProxy::from_node(&hy2, false)).unwrap();
        assert!(yaml.contains("ports: 443,20000-30000\nhop-interval: 30\n"));
    }

    #[test]
    fn test_hysteria2_obfs_password_needs_obfs() {
        let mut hy2 = node(Protocol::Hysteria2, Credential::Password("pw".to_string()));
        hy2.security = Security::tls();
        hy2.extra.insert("obfs-password".to_string(), "x".to_string());
        let yaml = serde_yaml::to_string(&MihomoProxy::from_node(&hy2, true)).unwrap();
        assert!(!yaml.contains("obfs"));

        hy2.extra.insert("obfs".to_string(), "salamander".to_string());
        let proxy = MihomoProxy::from_node(&hy2, false);
        assert_eq!(proxy.obfs.as_deref(), Some("salamander"));
        assert_eq!(proxy.obfs_password.as_deref(), Some("x"));
    }

    #[test]
    fn test_tuic_fields() {
        let mut tuic = node(
            Protocol::Tuic,
            Credential::UuidPassword {
                uuid: "id".to_string(),
                password: "pw".to_string(),
            },
        );
        tuic.security = Security::tls();
        tuic.extra
            .insert("congestion-control".to_string(), "bbr".to_string());
        tuic.extra.insert("reduce-rtt".to_string(), "true".to_string());
        let proxy = MihomoProxy::from_node(&tuic, false);
        assert_eq!(proxy.uuid.as_deref(), Some("id"));
        assert_eq!(proxy.password.as_deref(), Some("pw"));
        assert_eq!(proxy.congestion_controller.as_deref(), Some("bbr"));
        assert_eq!(proxy.reduce_rtt, Some(true));
    }

    #[test]
    fn test_shadowsocks_plugin_and_smux() {
        let mut ss = node(
            Protocol::Shadowsocks,
            Credential::Cipher {
                method: "aes-256-gcm".to_string(),
                secret: "pw".to_string(),
            },
        );
        ss.extra.insert("plugin".to_string(), "obfs".to_string());
        ss.extra.insert(
            "plugin-opts".to_string(),
            "obfs=http;obfs-host=www.bing.com".to_string(),
        );
        ss.extra.insert("mux".to_string(), "true".to_string());
        let yaml = serde_yaml::to_string(&MihomoProxy::from_node(&ss, false)).unwrap();
        assert_eq!(
            yaml,
            "name: n\ntype: ss\nserver: h.example\nport: 443\ncipher: aes-256-gcm\npassword: pw\nudp: true\nplugin: obfs\nplugin-opts:\n  host: www.bing.com\n  mode: http\nsmux:\n  enabled: true\n"
        );
    }

    #[test]
    fn test_ss2022_renders_as_ss() {
        let ss = node(
            Protocol::Shadowsocks2022,
            Credential::Cipher {
                method: "2022-blake3-aes-128-gcm".to_string(),
                secret: "key".to_string(),
            },
        );
        assert_eq!(MihomoProxy::from_node(&ss, false).kind, "ss");
    }

    #[test]
    fn test_passthrough_only_when_enabled() {
        let mut trojan = node(Protocol::Trojan, Credential::Password("pw".to_string()));
        trojan.extra.insert("custom".to_string(), "1".to_string());
        trojan.extra.insert("udp".to_string(), "false".to_string());
        trojan.extra.insert("mux".to_string(), "false".to_string());

        assert!(MihomoProxy::from_node(&trojan, false).passthrough.is_empty());

        let proxy = MihomoProxy::from_node(&trojan, true);
        assert_eq!(proxy.passthrough.len(), 1);
        assert_eq!(proxy.passthrough.get("custom").map(String::as_str), Some("1"));
        assert_eq!(proxy.smux, None);

        let yaml = serde_yaml::to_string(&proxy).unwrap();
        assert!(yaml.ends_with("udp: true\ncustom: '1'\n"));
    }

    #[test]
    fn test_plugin_opts_v2ray() {
        let opts = plugin_opts("v2ray-plugin", "mode=websocket;tls;host=a.example;mux=0");
        assert_eq!(opts.get("mode"), Some(&Value::String("websocket".to_string())));
        assert_eq!(opts.get("tls"), Some(&Value::Bool(true)));
        assert_eq!(opts.get("mux"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_plugin_opts_shadow_tls_version() {
        let opts = plugin_opts("shadow-tls", "host=a.example;password=x;version=3");
        assert_eq!(opts.get("version"), Some(&Value::from(3u64)));
    }

    #[test]
    fn test_unknown_extras_skip_consumed_keys() {
        let mut hy2 = node(Protocol::Hysteria2, Credential::Password("pw".to_string()));
        hy2.extra.insert("hop-interval".to_string(), "30".to_string());
        hy2.extra.insert("pinSHA256".to_string(), "ab".to_string());
        let unknown = unknown_extras(&hy2);
        assert_eq!(unknown.keys().collect::<Vec<_>>(), vec!["pinSHA256"]);
    }
}
