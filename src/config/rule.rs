//! Routing rule types
//!
//! Mihomo rules are flat strings (`DOMAIN-SUFFIX,google.com,Proxy`); the
//! typed [`RuleEntry`] is rendered into that form on serialization.

use std::fmt;

use serde::{Serialize, Serializer};

use super::group::{DIRECT, REJECT};

// ============================================================================
// Matcher
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Matcher {
    DomainSuffix(String),
    DomainKeyword(String),
    IpCidr(String),
    GeoIp(String),
    /// Catch-all (`MATCH`)
    Final,
}

impl Matcher {
    pub fn keyword(&self) -> &'static str {
        match self {
            Matcher::DomainSuffix(_) => "DOMAIN-SUFFIX",
            Matcher::DomainKeyword(_) => "DOMAIN-KEYWORD",
            Matcher::IpCidr(_) => "IP-CIDR",
            Matcher::GeoIp(_) => "GEOIP",
            Matcher::Final => "MATCH",
        }
    }

    pub fn payload(&self) -> Option<&str> {
        match self {
            Matcher::DomainSuffix(v)
            | Matcher::DomainKeyword(v)
            | Matcher::IpCidr(v)
            | Matcher::GeoIp(v) => Some(v),
            Matcher::Final => None,
        }
    }

    /// Only IP-based matchers accept `no-resolve`
    pub fn accepts_no_resolve(&self) -> bool {
        matches!(self, Matcher::IpCidr(_) | Matcher::GeoIp(_))
    }
}

// ============================================================================
// Target
// ============================================================================

/// Where matching traffic goes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    Direct,
    Reject,
    Group(String),
}

impl Target {
    pub fn name(&self) -> &str {
        match self {
            Target::Direct => DIRECT,
            Target::Reject => REJECT,
            Target::Group(name) => name,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Rule Entry
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleEntry {
    pub matcher: Matcher,
    pub target: Target,
    pub no_resolve: bool,
}

impl RuleEntry {
    pub fn new(matcher: Matcher, target: Target) -> Self {
        Self {
            matcher,
            target,
            no_resolve: false,
        }
    }

    /// Marks an IP matcher as `no-resolve`; ignored for other matchers
    pub fn no_resolve(mut self) -> Self {
        self.no_resolve = self.matcher.accepts_no_resolve();
        self
    }

    pub fn final_rule(target: Target) -> Self {
        Self::new(Matcher::Final, target)
    }

    pub fn is_final(&self) -> bool {
        self.matcher == Matcher::Final
    }

    /// Same rule routed elsewhere
    pub fn with_target(&self, target: Target) -> Self {
        Self {
            target,
            ..self.clone()
        }
    }
}

impl fmt::Display for RuleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.matcher.keyword())?;
        if let Some(payload) = self.matcher.payload() {
            write!(f, ",{payload}")?;
        }
        write!(f, ",{}", self.target)?;
        if self.no_resolve {
            f.write_str(",no-resolve")?;
        }
        Ok(())
    }
}

impl Serialize for RuleEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
