//! Display-name resolution
//!
//! Guarantees every node in a batch carries a unique, non-empty name. The
//! first occurrence of a name keeps it; later ones get ` (2)`, ` (3)`, ... in
//! input order.

use std::collections::HashSet;

use tracing::debug;

use crate::node::ProxyNode;

/// Built-in outbound names of the target config format
///
/// A node may not shadow these, so they are claimed before any node is seen.
pub const RESERVED_NAMES: &[&str] = &["DIRECT", "REJECT", "REJECT-DROP", "PASS", "COMPATIBLE"];

/// Makes every node name unique; idempotent on already-unique input
pub fn resolve(nodes: Vec<ProxyNode>) -> Vec<ProxyNode> {
    let mut claimed: HashSet<String> = RESERVED_NAMES.iter().map(|n| n.to_string()).collect();

    nodes
        .into_iter()
        .map(|node| {
            let trimmed = node.name.trim();
            let base = if trimmed.is_empty() {
                ProxyNode::default_name(node.protocol, &node.server, node.port)
            } else {
                trimmed.to_string()
            };
            let name = claim_name(&base, &mut claimed);
            if name == node.name {
                node
            } else {
                debug!(from = %node.name, to = %name, "Renamed node");
                node.with_name(name)
            }
        })
        .collect()
}

/// Claims `base`, or the first free `base (n)` for n >= 2
pub fn claim_name(base: &str, claimed: &mut HashSet<String>) -> String {
    if claimed.insert(base.to_string()) {
        return base.to_string();
    }
    (2u32..)
        .map(|n| format!("{base} ({n})"))
        .find(|candidate| claimed.insert(candidate.clone()))
        .unwrap_or_else(|| base.to_string())
}
