//! Rule list construction
//!
//! Every list starts with the LAN bypass. The full variant then routes the
//! static [`PROXY_MATCHERS`] set either to the primary group (allow-list) or
//! direct (deny-list), and ends with the opposite catch-all.

use tracing::debug;

use crate::config::rule::{Matcher, RuleEntry, Target};

use super::{RuleMode, Variant};

/// Bumped whenever [`PROXY_MATCHERS`] changes
pub const PROXY_MATCHERS_VERSION: &str = "2024.06";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Suffix,
    Keyword,
    Cidr,
    GeoIp,
}

/// Traffic known to need the proxy
static PROXY_MATCHERS: &[(Kind, &str)] = &[
    // Search and video
    (Kind::Suffix, "google.com"),
    (Kind::Suffix, "googleapis.com"),
    (Kind::Suffix, "gstatic.com"),
    (Kind::Suffix, "googlevideo.com"),
    (Kind::Suffix, "youtube.com"),
    (Kind::Suffix, "ytimg.com"),
    (Kind::Keyword, "google"),
    (Kind::Keyword, "youtube"),
    // Developer services
    (Kind::Suffix, "github.com"),
    (Kind::Suffix, "githubusercontent.com"),
    (Kind::Suffix, "stackoverflow.com"),
    (Kind::Suffix, "docker.io"),
    // AI services
    (Kind::Suffix, "openai.com"),
    (Kind::Suffix, "chatgpt.com"),
    (Kind::Suffix, "anthropic.com"),
    (Kind::Suffix, "claude.ai"),
    // Social
    (Kind::Suffix, "twitter.com"),
    (Kind::Suffix, "x.com"),
    (Kind::Suffix, "twimg.com"),
    (Kind::Suffix, "facebook.com"),
    (Kind::Suffix, "instagram.com"),
    (Kind::Suffix, "whatsapp.net"),
    (Kind::Suffix, "telegram.org"),
    (Kind::Suffix, "t.me"),
    (Kind::Suffix, "discord.com"),
    (Kind::Suffix, "reddit.com"),
    (Kind::Keyword, "telegram"),
    // Streaming
    (Kind::Suffix, "netflix.com"),
    (Kind::Suffix, "nflxvideo.net"),
    (Kind::Suffix, "spotify.com"),
    (Kind::Suffix, "wikipedia.org"),
    // Telegram data centers
    (Kind::Cidr, "91.108.4.0/22"),
    (Kind::Cidr, "91.108.8.0/22"),
    (Kind::Cidr, "91.108.56.0/22"),
    (Kind::Cidr, "149.154.160.0/20"),
    (Kind::GeoIp, "TELEGRAM"),
];

/// The matcher set as typed matchers, in table order
pub fn proxy_matchers() -> Vec<Matcher> {
    PROXY_MATCHERS
        .iter()
        .map(|&(kind, payload)| {
            let payload = payload.to_string();
            match kind {
                Kind::Suffix => Matcher::DomainSuffix(payload),
                Kind::Keyword => Matcher::DomainKeyword(payload),
                Kind::Cidr => Matcher::IpCidr(payload),
                Kind::GeoIp => Matcher::GeoIp(payload),
            }
        })
        .collect()
}

/// Local networks never leave through a proxy
pub fn lan_bypass() -> RuleEntry {
    RuleEntry::new(Matcher::GeoIp("LAN".to_string()), Target::Direct).no_resolve()
}

/// Builds the ordered rule list; the last entry is always the catch-all
pub fn build_rules(primary: &str, variant: Variant, mode: RuleMode) -> Vec<RuleEntry> {
    let proxy = Target::Group(primary.to_string());
    let mut rules = vec![lan_bypass()];

    match variant {
        Variant::Minimal => rules.push(RuleEntry::final_rule(proxy)),
        Variant::Full => {
            let matched = proxy_matchers()
                .into_iter()
                .map(|matcher| RuleEntry::new(matcher, proxy.clone()).no_resolve());
            match mode {
                RuleMode::AllowList => {
                    rules.extend(matched);
                    rules.push(RuleEntry::final_rule(Target::Direct));
                }
                // Same matchers with the targets swapped
                RuleMode::DenyList => {
                    rules.extend(matched.map(|rule| rule.with_target(Target::Direct)));
                    rules.push(RuleEntry::final_rule(proxy));
                }
            }
        }
    }

    debug!(
        "Built {} rules ({:?}, {:?}, matchers {})",
        rules.len(),
        variant,
        mode,
        PROXY_MATCHERS_VERSION
    );
    rules
}
