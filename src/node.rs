//! Canonical proxy node model
//!
//! Every protocol decoder produces a [`ProxyNode`]; everything downstream of
//! the parser (name resolution, grouping, serialization) works on this type only.

use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Protocol
// ============================================================================

/// Supported proxy dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Protocol {
    Vless,
    Vmess,
    Trojan,
    Shadowsocks,
    Shadowsocks2022,
    Hysteria,
    Hysteria2,
    Tuic,
}

impl Protocol {
    /// All protocols in declaration order
    pub const ALL: [Protocol; 8] = [
        Protocol::Vless,
        Protocol::Vmess,
        Protocol::Trojan,
        Protocol::Shadowsocks,
        Protocol::Shadowsocks2022,
        Protocol::Hysteria,
        Protocol::Hysteria2,
        Protocol::Tuic,
    ];

    /// Short lowercase label, used for default node names and log fields
    pub fn label(&self) -> &'static str {
        match self {
            Protocol::Vless => "vless",
            Protocol::Vmess => "vmess",
            Protocol::Trojan => "trojan",
            Protocol::Shadowsocks => "ss",
            Protocol::Shadowsocks2022 => "ss2022",
            Protocol::Hysteria => "hysteria",
            Protocol::Hysteria2 => "hysteria2",
            Protocol::Tuic => "tuic",
        }
    }

    /// Human-facing name, used for protocol sub-groups
    pub fn display_name(&self) -> &'static str {
        match self {
            Protocol::Vless => "VLESS",
            Protocol::Vmess => "VMess",
            Protocol::Trojan => "Trojan",
            Protocol::Shadowsocks => "Shadowsocks",
            Protocol::Shadowsocks2022 => "SS2022",
            Protocol::Hysteria => "Hysteria",
            Protocol::Hysteria2 => "Hysteria2",
            Protocol::Tuic => "TUIC",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Credential
// ============================================================================

/// Primary secret material, shaped by protocol
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// VLESS user id
    Uuid(String),
    /// VMess user id with legacy alter id and body cipher
    Vmess {
        uuid: String,
        alter_id: u32,
        cipher: String,
    },
    /// Trojan password, Hysteria auth string, Hysteria2 password
    Password(String),
    /// Shadowsocks method and secret (a base64 PSK list for 2022 methods)
    Cipher { method: String, secret: String },
    /// TUIC v5 user id and password
    UuidPassword { uuid: String, password: String },
}

// ============================================================================
// Transport
// ============================================================================

/// Stream transport sub-dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransportKind {
    #[default]
    Tcp,
    Ws,
    Http,
    H2,
    Grpc,
    Quic,
    FakeTcp,
    WechatVideo,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Tcp => "tcp",
            TransportKind::Ws => "ws",
            TransportKind::Http => "http",
            TransportKind::H2 => "h2",
            TransportKind::Grpc => "grpc",
            TransportKind::Quic => "quic",
            TransportKind::FakeTcp => "fake-tcp",
            TransportKind::WechatVideo => "wechat-video",
        }
    }
}

/// Transport kind plus its options (`path`, `host`, `service-name`, `mode`, `method`)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transport {
    pub kind: TransportKind,
    pub options: BTreeMap<String, String>,
}

impl Transport {
    pub fn new(kind: TransportKind) -> Self {
        Self {
            kind,
            options: BTreeMap::new(),
        }
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }
}

// ============================================================================
// Security
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecurityKind {
    #[default]
    None,
    Tls,
    Reality,
}

/// TLS / REALITY parameters
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Security {
    pub kind: SecurityKind,
    pub sni: Option<String>,
    /// uTLS client fingerprint
    pub fingerprint: Option<String>,
    /// REALITY public key
    pub public_key: Option<String>,
    /// REALITY short id
    pub short_id: Option<String>,
    pub alpn: Option<Vec<String>>,
    pub allow_insecure: bool,
}

impl Security {
    pub fn tls() -> Self {
        Self {
            kind: SecurityKind::Tls,
            ..Default::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.kind != SecurityKind::None
    }
}

// ============================================================================
// ProxyNode
// ============================================================================

/// One fully validated egress endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyNode {
    pub name: String,
    pub protocol: Protocol,
    pub server: String,
    pub port: u16,
    pub credential: Credential,
    pub transport: Transport,
    pub security: Security,
    /// Protocol-specific flags plus any unrecognized query keys, verbatim
    pub extra: BTreeMap<String, String>,
}

impl ProxyNode {
    /// `<label>-<server>:<port>`, used when a link carries no fragment
    pub fn default_name(protocol: Protocol, server: &str, port: u16) -> String {
        format!("{}-{}:{}", protocol.label(), server, port)
    }

    /// Consume the node and return it under a different display name
    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self
        }
    }

    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(String::as_str)
    }

    /// Interpret an `extra` entry stored as `"true"`/`"false"`
    pub fn extra_flag(&self, key: &str) -> bool {
        self.extra(key) == Some("true")
    }
}
