use serde::Serialize;

use crate::config::general::GeneralSettings;
use crate::config::group::ProxyGroup;
use crate::config::proxy::MihomoProxy;
use crate::config::rule::RuleEntry;
use crate::node::ProxyNode;

pub mod general;
pub mod group;
pub mod proxy;
pub mod rule;
pub mod util;
pub mod validation;

/// Assembled Mihomo configuration
///
/// Built once per conversion and rendered with [`ConfigDocument::to_text`].
/// Top-level keys are always written in the order general block, `proxies`,
/// `proxy-groups`, `rules`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigDocument {
    /// Runtime settings block (full variant only)
    pub general: Option<GeneralSettings>,

    /// Nodes in input order
    pub nodes: Vec<ProxyNode>,

    pub groups: Vec<ProxyGroup>,

    /// First match wins; the last entry is the catch-all
    pub rules: Vec<RuleEntry>,

    /// Emit unrecognized link parameters on each proxy
    pub emit_unknown_extras: bool,
}

/// Serialized shape of [`ConfigDocument`]
#[derive(Serialize)]
struct DocumentView<'a> {
    #[serde(flatten)]
    general: Option<&'a GeneralSettings>,
    proxies: Vec<MihomoProxy>,
    #[serde(rename = "proxy-groups")]
    proxy_groups: &'a [ProxyGroup],
    rules: &'a [RuleEntry],
}

impl ConfigDocument {
    /// Create a new empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document builder
    pub fn builder() -> ConfigDocumentBuilder {
        ConfigDocumentBuilder::new()
    }

    /// Rendered `proxies` entries
    pub fn proxies(&self) -> Vec<MihomoProxy> {
        self.nodes
            .iter()
            .map(|node| MihomoProxy::from_node(node, self.emit_unknown_extras))
            .collect()
    }

    /// Serialize the document to Mihomo YAML
    pub fn to_text(&self) -> Result<String, serde_yaml::Error> {
        let view = DocumentView {
            general: self.general.as_ref(),
            proxies: self.proxies(),
            proxy_groups: &self.groups,
            rules: &self.rules,
        };
        serde_yaml::to_string(&view)
    }

    pub fn group(&self, name: &str) -> Option<&ProxyGroup> {
        self.groups.iter().find(|group| group.name == name)
    }

    /// The catch-all rule, if it is in place
    pub fn final_rule(&self) -> Option<&RuleEntry> {
        self.rules.last().filter(|rule| rule.is_final())
    }
}

/// Builder for ConfigDocument
#[derive(Default)]
pub struct ConfigDocumentBuilder {
    document: ConfigDocument,
}

impl ConfigDocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn general(mut self, general: GeneralSettings) -> Self {
        self.document.general = Some(general);
        self
    }

    pub fn nodes(mut self, nodes: Vec<ProxyNode>) -> Self {
        self.document.nodes = nodes;
        self
    }

    pub fn groups(mut self, groups: Vec<ProxyGroup>) -> Self {
        self.document.groups.extend(groups);
        self
    }

    pub fn rules(mut self, rules: Vec<RuleEntry>) -> Self {
        self.document.rules.extend(rules);
        self
    }

    pub fn emit_unknown_extras(mut self, enabled: bool) -> Self {
        self.document.emit_unknown_extras = enabled;
        self
    }

    pub fn build(self) -> ConfigDocument {
        self.document
    }
}
