use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::general::GeneralSettings;
use crate::config::group::{HealthCheck, is_sentinel};
use crate::config::util::default_true;

use super::helpers::expand_tilde;
use super::region::is_country_code;
use super::{RuleMode, Variant};

// ============================================================================
// Generator Settings Types
// ============================================================================

/// Generator settings parsed from TOML file
///
/// Every field has a default, so an empty file is valid.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GeneratorSettings {
    /// Output shape, default "full"
    #[serde(default)]
    pub variant: Variant,

    /// Rule routing mode, default "allow-list"
    #[serde(default)]
    pub mode: RuleMode,

    /// Emit link parameters Mihomo has no field for
    #[serde(default)]
    pub emit_unknown_extras: bool,

    #[serde(default)]
    pub groups: GroupSettings,

    /// Runtime block written by the full variant
    #[serde(default)]
    pub general: GeneralSettings,
}

/// `[groups]` table
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GroupSettings {
    /// Primary selector name, default "Proxy"
    #[serde(default = "default_primary")]
    pub primary: String,

    /// Aggregate url-test group name, default "Auto"
    #[serde(default = "default_auto")]
    pub auto: String,

    /// Fallback group name, default "Fallback"
    #[serde(default = "default_fallback")]
    pub fallback: String,

    /// Emit the fallback group
    #[serde(default)]
    pub fallback_group: bool,

    /// One url-test group per protocol
    #[serde(default = "default_true")]
    pub protocol_groups: bool,

    /// One url-test group per flag emoji region
    #[serde(default = "default_true")]
    pub region_groups: bool,

    /// Regions to group (e.g., ["US", "JP", "HK"])
    /// If empty, every region found in node names is grouped
    #[serde(default)]
    pub country_codes: Vec<String>,

    /// Latency probe URL
    #[serde(default = "default_test_url")]
    pub test_url: String,

    /// Probe interval in seconds
    #[serde(default = "default_interval")]
    pub interval: u32,

    /// url-test switch tolerance in milliseconds
    #[serde(default = "default_tolerance")]
    pub tolerance: u32,
}

impl Default for GroupSettings {
    fn default() -> Self {
        Self {
            primary: default_primary(),
            auto: default_auto(),
            fallback: default_fallback(),
            fallback_group: false,
            protocol_groups: true,
            region_groups: true,
            country_codes: Vec::new(),
            test_url: default_test_url(),
            interval: default_interval(),
            tolerance: default_tolerance(),
        }
    }
}

impl GroupSettings {
    pub fn health_check(&self) -> HealthCheck {
        HealthCheck {
            url: self.test_url.clone(),
            interval: self.interval,
            tolerance: self.tolerance,
        }
    }

    /// Country code filter, uppercased; empty means every region
    pub fn allowed_regions(&self) -> HashSet<String> {
        self.country_codes
            .iter()
            .map(|code| code.to_ascii_uppercase())
            .collect()
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (field, name) in [
            ("primary", &self.primary),
            ("auto", &self.auto),
            ("fallback", &self.fallback),
        ] {
            let name = name.trim();
            if name.is_empty() {
                anyhow::bail!("groups.{field} must not be empty");
            }
            if name.contains(',') {
                anyhow::bail!("groups.{field} must not contain ',': {name}");
            }
            if is_sentinel(name) {
                anyhow::bail!("groups.{field} must not be a built-in outbound: {name}");
            }
            if !seen.insert(name) {
                anyhow::bail!("groups.{field} duplicates another group name: {name}");
            }
        }

        if self.interval == 0 {
            anyhow::bail!("groups.interval must be greater than zero");
        }

        if let Some(code) = self.country_codes.iter().find(|c| !is_country_code(c)) {
            anyhow::bail!("Invalid country code in groups.country_codes: {code}");
        }

        Ok(())
    }
}

// ============================================================================
// Settings Loading
// ============================================================================

impl GeneratorSettings {
    /// Parse generator settings from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: GeneratorSettings =
            toml::from_str(content).context("Failed to parse generator settings TOML")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.groups.validate().context("Invalid [groups] settings")
    }

    /// Load generator settings from file path
    pub async fn from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read generator settings from {:?}", path))?;
        Self::from_toml(&content)
    }

    /// Load generator settings, expanding `~` in the path
    pub async fn load(path: &str) -> Result<Self> {
        let expanded = expand_tilde(path);
        Self::from_file(Path::new(&expanded)).await
    }
}

fn default_primary() -> String {
    "Proxy".to_string()
}

fn default_auto() -> String {
    "Auto".to_string()
}

fn default_fallback() -> String {
    "Fallback".to_string()
}

fn default_test_url() -> String {
    "https://www.gstatic.com/generate_204".to_string()
}

fn default_interval() -> u32 {
    300
}

fn default_tolerance() -> u32 {
    50
}
