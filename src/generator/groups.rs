//! Proxy group construction
//!
//! Every variant gets the primary selector. The full variant adds protocol
//! and region url-test groups, an auto group over them, and an optional
//! fallback group. Group names are claimed after node names, so a node that
//! already uses a configured group name pushes the group to `name (n)`.

use std::collections::HashSet;

use tracing::debug;

use crate::config::group::{DIRECT, HealthCheck, ProxyGroup, REJECT};
use crate::node::{Protocol, ProxyNode};
use crate::parser::names::{RESERVED_NAMES, claim_name};

use super::Variant;
use super::region::{extract_country_code, region_group_name};
use super::settings::GroupSettings;

/// Groups in emission order plus the name the primary selector ended up with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSet {
    pub primary: String,
    pub groups: Vec<ProxyGroup>,
}

pub struct GroupBuilder<'a> {
    settings: &'a GroupSettings,
}

impl<'a> GroupBuilder<'a> {
    pub fn new(settings: &'a GroupSettings) -> Self {
        Self { settings }
    }

    /// Builds the groups for already-resolved nodes
    pub fn build(&self, nodes: &[ProxyNode], variant: Variant) -> GroupSet {
        let mut claimed: HashSet<String> = RESERVED_NAMES
            .iter()
            .map(|name| name.to_string())
            .chain(nodes.iter().map(|node| node.name.clone()))
            .collect();
        let node_names: Vec<String> = nodes.iter().map(|node| node.name.clone()).collect();
        let primary = claim_name(self.settings.primary.trim(), &mut claimed);

        let set = match variant {
            Variant::Minimal => GroupSet {
                groups: vec![ProxyGroup::select(
                    primary.clone(),
                    with_sentinels(node_names),
                )],
                primary,
            },
            Variant::Full => self.build_full(nodes, node_names, primary, &mut claimed),
        };

        debug!(
            "Built {} proxy groups for {} nodes ({:?})",
            set.groups.len(),
            nodes.len(),
            variant
        );
        set
    }

    fn build_full(
        &self,
        nodes: &[ProxyNode],
        node_names: Vec<String>,
        primary: String,
        claimed: &mut HashSet<String>,
    ) -> GroupSet {
        let check = self.settings.health_check();

        // Claim in emission order so suffixes are stable
        let auto_name = claim_name(self.settings.auto.trim(), claimed);
        let protocol_groups = if self.settings.protocol_groups {
            build_protocol_groups(nodes, claimed, &check)
        } else {
            Vec::new()
        };
        let region_groups = if self.settings.region_groups {
            build_region_groups(nodes, &self.settings.allowed_regions(), claimed, &check)
        } else {
            Vec::new()
        };
        let fallback = (self.settings.fallback_group && !node_names.is_empty()).then(|| {
            ProxyGroup::fallback(
                claim_name(self.settings.fallback.trim(), claimed),
                node_names.clone(),
                &check,
            )
        });

        let sub_group_names: Vec<String> = protocol_groups
            .iter()
            .chain(&region_groups)
            .map(|group| group.name.clone())
            .collect();
        let auto = (!sub_group_names.is_empty())
            .then(|| ProxyGroup::url_test(auto_name, sub_group_names.clone(), &check));

        let mut primary_members: Vec<String> = Vec::new();
        primary_members.extend(auto.iter().map(|group| group.name.clone()));
        primary_members.extend(sub_group_names);
        primary_members.extend(fallback.iter().map(|group| group.name.clone()));
        primary_members.extend(node_names);

        let mut groups = vec![ProxyGroup::select(
            primary.clone(),
            with_sentinels(primary_members),
        )];
        groups.extend(auto);
        groups.extend(protocol_groups);
        groups.extend(region_groups);
        groups.extend(fallback);

        GroupSet { primary, groups }
    }
}

fn with_sentinels(mut members: Vec<String>) -> Vec<String> {
    members.push(DIRECT.to_string());
    members.push(REJECT.to_string());
    members
}

/// One url-test group per protocol, in first-seen order
fn build_protocol_groups(
    nodes: &[ProxyNode],
    claimed: &mut HashSet<String>,
    check: &HealthCheck,
) -> Vec<ProxyGroup> {
    let mut order: Vec<(Protocol, Vec<String>)> = Vec::new();
    for node in nodes {
        match order.iter_mut().find(|(protocol, _)| *protocol == node.protocol) {
            Some((_, members)) => members.push(node.name.clone()),
            None => order.push((node.protocol, vec![node.name.clone()])),
        }
    }

    order
        .into_iter()
        .map(|(protocol, members)| {
            let name = claim_name(protocol.display_name(), claimed);
            ProxyGroup::url_test(name, members, check)
        })
        .collect()
}

/// One url-test group per flag-emoji region, in first-seen order
fn build_region_groups(
    nodes: &[ProxyNode],
    allowed: &HashSet<String>,
    claimed: &mut HashSet<String>,
    check: &HealthCheck,
) -> Vec<ProxyGroup> {
    let mut order: Vec<(String, Vec<String>)> = Vec::new();
    for node in nodes {
        let Some(code) = extract_country_code(&node.name) else {
            continue;
        };
        if !allowed.is_empty() && !allowed.contains(&code) {
            continue;
        }
        match order.iter_mut().find(|(seen, _)| *seen == code) {
            Some((_, members)) => members.push(node.name.clone()),
            None => order.push((code, vec![node.name.clone()])),
        }
    }

    order
        .into_iter()
        .map(|(code, members)| {
            let name = claim_name(&region_group_name(&code), claimed);
            debug!(
                "Generated region group: {} with {} nodes",
                name,
                members.len()
            );
            ProxyGroup::url_test(name, members, check)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::group::GroupKind;
    use crate::node::{Credential, Security, Transport};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn node(name: &str, protocol: Protocol) -> ProxyNode {
        ProxyNode {
            name: name.to_string(),
            protocol,
            server: "h.example".to_string(),
            port: 443,
            credential: Credential::Password("pw".to_string()),
            transport: Transport::default(),
            security: Security::tls(),
            extra: BTreeMap::new(),
        }
    }

    fn names(groups: &[ProxyGroup]) -> Vec<&str> {
        groups.iter().map(|g| g.name.as_str()).collect()
    }

    #[test]
    fn test_minimal_single_selector() {
        let settings = GroupSettings::default();
        let nodes = vec![node("a", Protocol::Trojan), node("b", Protocol::Vless)];
        let set = GroupBuilder::new(&settings).build(&nodes, Variant::Minimal);

        assert_eq!(set.primary, "Proxy");
        assert_eq!(set.groups.len(), 1);
        assert_eq!(set.groups[0].kind, GroupKind::Select);
        assert_eq!(set.groups[0].members, vec!["a", "b", "DIRECT", "REJECT"]);
    }

    #[test]
    fn test_full_group_order_and_members() {
        let settings = GroupSettings {
            fallback_group: true,
            ..Default::default()
        };
        let nodes = vec![
            node("🇯🇵 Tokyo", Protocol::Hysteria2),
            node("🇺🇸 LA", Protocol::Trojan),
            node("plain", Protocol::Hysteria2),
            node("🇯🇵 Osaka", Protocol::Trojan),
        ];
        let set = GroupBuilder::new(&settings).build(&nodes, Variant::Full);

        assert_eq!(
            names(&set.groups),
            vec!["Proxy", "Auto", "Hysteria2", "Trojan", "🇯🇵 JP", "🇺🇸 US", "Fallback"]
        );

        let primary = &set.groups[0];
        assert_eq!(
            primary.members,
            vec![
                "Auto",
                "Hysteria2",
                "Trojan",
                "🇯🇵 JP",
                "🇺🇸 US",
                "Fallback",
                "🇯🇵 Tokyo",
                "🇺🇸 LA",
                "plain",
                "🇯🇵 Osaka",
                "DIRECT",
                "REJECT",
            ]
        );

        let auto = &set.groups[1];
        assert_eq!(auto.kind, GroupKind::UrlTest);
        assert_eq!(auto.members, vec!["Hysteria2", "Trojan", "🇯🇵 JP", "🇺🇸 US"]);

        assert_eq!(set.groups[2].members, vec!["🇯🇵 Tokyo", "plain"]);
        assert_eq!(set.groups[4].members, vec!["🇯🇵 Tokyo", "🇯🇵 Osaka"]);
        assert_eq!(set.groups[6].kind, GroupKind::Fallback);
        assert_eq!(set.groups[6].members.len(), 4);
    }

    #[test]
    fn test_country_code_filter() {
        let settings = GroupSettings {
            country_codes: vec!["us".to_string()],
            protocol_groups: false,
            ..Default::default()
        };
        let nodes = vec![node("🇯🇵 a", Protocol::Trojan), node("🇺🇸 b", Protocol::Trojan)];
        let set = GroupBuilder::new(&settings).build(&nodes, Variant::Full);
        assert_eq!(names(&set.groups), vec!["Proxy", "Auto", "🇺🇸 US"]);
    }

    #[test]
    fn test_no_sub_groups_means_no_auto() {
        let settings = GroupSettings {
            protocol_groups: false,
            region_groups: false,
            ..Default::default()
        };
        let set = GroupBuilder::new(&settings).build(&[node("a", Protocol::Trojan)], Variant::Full);
        assert_eq!(names(&set.groups), vec!["Proxy"]);
        assert_eq!(set.groups[0].members, vec!["a", "DIRECT", "REJECT"]);
    }

    #[test]
    fn test_empty_node_list() {
        let settings = GroupSettings {
            fallback_group: true,
            ..Default::default()
        };
        let set = GroupBuilder::new(&settings).build(&[], Variant::Full);
        assert_eq!(names(&set.groups), vec!["Proxy"]);
        assert_eq!(set.groups[0].members, vec!["DIRECT", "REJECT"]);
    }

    #[test]
    fn test_group_names_avoid_node_names() {
        let settings = GroupSettings::default();
        let nodes = vec![node("Proxy", Protocol::Trojan), node("Trojan", Protocol::Trojan)];
        let set = GroupBuilder::new(&settings).build(&nodes, Variant::Full);
        assert_eq!(set.primary, "Proxy (2)");
        assert_eq!(names(&set.groups), vec!["Proxy (2)", "Auto", "Trojan (2)"]);
        assert_eq!(set.groups[2].members, vec!["Proxy", "Trojan"]);
    }
}
