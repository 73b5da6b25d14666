use serde::{Deserialize, Serialize};

/// Top-level Mihomo runtime settings, emitted by the full variant only
///
/// Field names are snake_case in the TOML settings file and kebab-case in the
/// rendered YAML.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all(serialize = "kebab-case"), default, deny_unknown_fields)]
pub struct GeneralSettings {
    /// Combined HTTP/SOCKS listener port.
    pub mixed_port: u16,

    /// Accept connections from other hosts on the LAN.
    pub allow_lan: bool,

    pub mode: RunMode,

    pub log_level: LogLevel,

    pub ipv6: bool,

    /// RESTful controller listen address.
    pub external_controller: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            mixed_port: 7890,
            allow_lan: false,
            mode: RunMode::Rule,
            log_level: LogLevel::Info,
            ipv6: false,
            external_controller: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Mihomo routing mode
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Rule,
    Global,
    Direct,
}

/// Mihomo log level
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Silent,
    Error,
    Warning,
    #[default]
    Info,
    Debug,
}
