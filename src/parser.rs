//! Share-link parsing
//!
//! This module provides:
//! - Field-level decoding helpers (percent, Base64, host:port, ranges)
//! - One decoder per protocol dialect, selected by a static scheme table
//! - Batch parsing that skips and counts bad links instead of aborting
//! - Display-name resolution for the parsed batch

pub mod codec;
pub mod detection;
pub mod error;
pub mod link;
pub mod names;
pub mod protocols;

pub use error::LinkError;

use tracing::{debug, warn};

use crate::node::ProxyNode;

use link::extract_scheme;
use protocols::decoder_for;

// ============================================================================
// Parse Outcome
// ============================================================================

/// Result of parsing one batch of links
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    /// Valid nodes in input order
    pub nodes: Vec<ProxyNode>,
    /// Non-empty lines that produced no node
    pub invalid_count: usize,
    /// Non-empty lines seen
    pub link_count: usize,
}

// ============================================================================
// Proxy Parser
// ============================================================================

/// Dispatches links to their protocol decoder
#[derive(Debug, Clone, Copy, Default)]
pub struct ProxyParser;

impl ProxyParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses a single link with the decoder registered for its scheme
    pub fn parse_link(&self, link: &str) -> Result<ProxyNode, LinkError> {
        let link = link.trim();
        let scheme = extract_scheme(link)?;
        let decode = decoder_for(&scheme).ok_or_else(|| LinkError::unsupported_scheme(&scheme))?;
        decode(link)
    }

    /// Parses a batch; a failing link is counted and skipped
    pub fn parse<S: AsRef<str>>(&self, raw_links: &[S]) -> ParseOutcome {
        let mut outcome = ParseOutcome::default();

        for link in raw_links.iter().map(|l| l.as_ref().trim()) {
            if link.is_empty() {
                continue;
            }
            outcome.link_count += 1;

            match self.parse_link(link) {
                Ok(node) => outcome.nodes.push(node),
                Err(e) => {
                    outcome.invalid_count += 1;
                    warn!(link = %preview(link), "Skipping link: {}", e);
                }
            }
        }

        debug!(
            "Link parsing complete: {} total, {} successful, {} failed",
            outcome.link_count,
            outcome.nodes.len(),
            outcome.invalid_count
        );
        outcome
    }
}

/// Truncated link for log lines
fn preview(link: &str) -> String {
    match link.split_once("://") {
        Some((scheme, rest)) => {
            let head: String = rest.chars().take(12).collect();
            format!("{scheme}://{head}...")
        }
        None => link.chars().take(16).collect(),
    }
}
