//! Proxy group types
//!
//! Groups reference nodes, other groups, or one of the built-in sentinel
//! outbounds by name.

use serde::Serialize;

/// Built-in outbound that connects without a proxy
pub const DIRECT: &str = "DIRECT";
/// Built-in outbound that refuses the connection
pub const REJECT: &str = "REJECT";
/// Sentinels a group member or rule target may name without declaring them
pub const SENTINELS: [&str; 2] = [DIRECT, REJECT];

/// Whether `name` is a built-in sentinel outbound
pub fn is_sentinel(name: &str) -> bool {
    SENTINELS.contains(&name)
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum GroupKind {
    Select,
    UrlTest,
    Fallback,
}

/// Latency probe shared by `url-test` and `fallback` groups
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HealthCheck {
    pub url: String,
    /// Seconds between probes
    pub interval: u32,
    /// Milliseconds a faster node must win by before a switch
    pub tolerance: u32,
}

/// One `proxy-groups` entry
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ProxyGroup {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: GroupKind,

    #[serde(rename = "proxies")]
    pub members: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<u32>,
}

impl ProxyGroup {
    /// Manual selector
    pub fn select(name: impl Into<String>, members: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind: GroupKind::Select,
            members,
            url: None,
            interval: None,
            tolerance: None,
        }
    }

    /// Lowest-latency selector
    pub fn url_test(name: impl Into<String>, members: Vec<String>, check: &HealthCheck) -> Self {
        Self {
            name: name.into(),
            kind: GroupKind::UrlTest,
            members,
            url: Some(check.url.clone()),
            interval: Some(check.interval),
            tolerance: Some(check.tolerance),
        }
    }

    /// First healthy member in order; tolerance does not apply
    pub fn fallback(name: impl Into<String>, members: Vec<String>, check: &HealthCheck) -> Self {
        Self {
            name: name.into(),
            kind: GroupKind::Fallback,
            members,
            url: Some(check.url.clone()),
            interval: Some(check.interval),
            tolerance: None,
        }
    }
}
