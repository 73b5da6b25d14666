//! Configuration generator module
//!
//! This module turns a batch of parsed nodes into a validated Mihomo
//! [`ConfigDocument`]: names are resolved, groups and rules are built, and
//! the result is checked for dangling references before it is returned.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ConfigDocument;
use crate::node::ProxyNode;
use crate::parser::names;

// Sub-modules
pub mod groups;
pub mod helpers;
pub mod region;
pub mod rules;
pub mod settings;

// Re-exports
pub use groups::{GroupBuilder, GroupSet};
pub use helpers::expand_tilde;
pub use rules::{PROXY_MATCHERS_VERSION, build_rules};
pub use settings::{GeneratorSettings, GroupSettings};

// ============================================================================
// Output Options
// ============================================================================

/// Output shape
#[derive(Serialize, Deserialize, ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Nodes, one selector, LAN bypass and a catch-all
    #[serde(alias = "simple")]
    #[value(alias = "simple")]
    Minimal,
    /// General block, sub-groups and the full rule set
    #[default]
    Full,
}

/// How the matcher set routes traffic
#[derive(Serialize, Deserialize, ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RuleMode {
    /// Matched traffic uses the proxy, everything else goes direct
    #[default]
    #[serde(alias = "whitelist")]
    #[value(alias = "whitelist")]
    AllowList,
    /// Matched traffic goes direct, everything else uses the proxy
    #[serde(alias = "blacklist")]
    #[value(alias = "blacklist")]
    DenyList,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Minimal => f.write_str("minimal"),
            Variant::Full => f.write_str("full"),
        }
    }
}

impl fmt::Display for RuleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleMode::AllowList => f.write_str("allow-list"),
            RuleMode::DenyList => f.write_str("deny-list"),
        }
    }
}

// ============================================================================
// Generator
// ============================================================================

/// Assembles Mihomo documents; holds no state besides its settings
#[derive(Debug, Clone, Default)]
pub struct Generator {
    settings: GeneratorSettings,
}

impl Generator {
    /// Create a new generator with the given settings
    pub fn new(settings: GeneratorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Resolve names, assemble and validate
    pub fn generate(
        &self,
        nodes: Vec<ProxyNode>,
        variant: Variant,
        mode: RuleMode,
    ) -> ConfigDocument {
        info!(
            "Generating {} config for {} nodes ({})",
            variant,
            nodes.len(),
            mode
        );
        let nodes = names::resolve(nodes);
        let document = self.assemble(nodes, variant, mode);

        let result = document.validate();
        debug_assert!(
            result.is_ok(),
            "assembled document failed validation: {:?}",
            result.errors
        );
        document
    }

    /// Composes a document from nodes whose names are already unique
    pub fn assemble(
        &self,
        nodes: Vec<ProxyNode>,
        variant: Variant,
        mode: RuleMode,
    ) -> ConfigDocument {
        let GroupSet { primary, groups } =
            GroupBuilder::new(&self.settings.groups).build(&nodes, variant);
        let rules = build_rules(&primary, variant, mode);
        debug!(
            "Assembled {} proxies, {} groups, {} rules",
            nodes.len(),
            groups.len(),
            rules.len()
        );

        let builder = ConfigDocument::builder()
            .nodes(nodes)
            .groups(groups)
            .rules(rules)
            .emit_unknown_extras(self.settings.emit_unknown_extras);
        match variant {
            Variant::Full => builder.general(self.settings.general.clone()).build(),
            Variant::Minimal => builder.build(),
        }
    }
}
