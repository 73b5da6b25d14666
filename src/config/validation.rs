//! Configuration validation module.
//!
//! Integrity checks run on every assembled document before it is rendered:
//! unique names, resolvable group members and rule targets, and exactly one
//! trailing catch-all rule.

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, warn};

use crate::config::ConfigDocument;
use crate::config::group::is_sentinel;

// ============================================================================
// Error Types
// ============================================================================

/// Document validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Two proxies or groups share a name.
    DuplicateName {
        /// The duplicated name.
        name: String,
    },

    /// A proxy or group uses a built-in outbound name.
    ReservedName {
        /// The offending name.
        name: String,
    },

    /// A group has no members.
    EmptyGroup {
        /// The group name.
        group: String,
    },

    /// A group lists a member that is neither a proxy, a group nor a sentinel.
    DanglingMember {
        /// The group name.
        group: String,
        /// The unresolved member.
        member: String,
    },

    /// A rule routes to an unknown outbound.
    DanglingTarget {
        /// The rule index (0-based).
        rule_index: usize,
        /// The unresolved target.
        target: String,
    },

    /// No `MATCH` rule.
    MissingFinalRule,

    /// A `MATCH` rule that is not the last rule.
    MisplacedFinalRule {
        /// The rule index (0-based).
        rule_index: usize,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateName { name } => write!(f, "duplicate proxy or group name '{name}'"),
            Self::ReservedName { name } => write!(f, "'{name}' is a built-in outbound name"),
            Self::EmptyGroup { group } => write!(f, "group '{group}' has no members"),
            Self::DanglingMember { group, member } => {
                write!(f, "group '{group}' references non-existent proxy '{member}'")
            }
            Self::DanglingTarget { rule_index, target } => {
                let rule_num = rule_index + 1;
                write!(f, "rule #{rule_num} targets non-existent outbound '{target}'")
            }
            Self::MissingFinalRule => write!(f, "rule list has no final MATCH rule"),
            Self::MisplacedFinalRule { rule_index } => {
                let rule_num = rule_index + 1;
                write!(f, "final MATCH rule #{rule_num} is not the last rule")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

// ============================================================================
// Validation Result
// ============================================================================

/// Result of document validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors found.
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if validation passed (no errors).
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Convert to a Result type.
    ///
    /// # Errors
    ///
    /// Returns the list of errors if validation failed.
    pub fn into_result(self) -> Result<(), Vec<ValidationError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }

    /// Log all errors using tracing.
    pub fn log_errors(&self) {
        for error in &self.errors {
            warn!(error = %error, "document validation error");
        }
    }
}

// ============================================================================
// Validation Implementation
// ============================================================================

impl ConfigDocument {
    /// Validate the document and return every problem found.
    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();

        debug!("starting document validation");

        let names = self.collect_names(&mut result);
        debug!(count = names.len(), "collected proxy and group names");

        self.check_group_members(&names, &mut result);
        self.check_rules(&names, &mut result);

        if result.is_ok() {
            debug!("document validation passed");
        } else {
            warn!(
                error_count = result.error_count(),
                "document validation failed"
            );
            result.log_errors();
        }

        result
    }

    /// Collect proxy and group names, flagging duplicates and reserved names.
    fn collect_names(&self, result: &mut ValidationResult) -> HashSet<String> {
        let mut names = HashSet::new();

        let all = self
            .nodes
            .iter()
            .map(|node| &node.name)
            .chain(self.groups.iter().map(|group| &group.name));
        for name in all {
            if is_sentinel(name) {
                result.add_error(ValidationError::ReservedName { name: name.clone() });
            }
            if !names.insert(name.clone()) {
                result.add_error(ValidationError::DuplicateName { name: name.clone() });
            }
        }

        names
    }

    fn check_group_members(&self, names: &HashSet<String>, result: &mut ValidationResult) {
        for group in &self.groups {
            if group.members.is_empty() {
                result.add_error(ValidationError::EmptyGroup {
                    group: group.name.clone(),
                });
            }
            for member in &group.members {
                if !names.contains(member) && !is_sentinel(member) {
                    result.add_error(ValidationError::DanglingMember {
                        group: group.name.clone(),
                        member: member.clone(),
                    });
                }
            }
        }
    }

    fn check_rules(&self, names: &HashSet<String>, result: &mut ValidationResult) {
        let last = self.rules.len().saturating_sub(1);
        let mut saw_final = false;

        for (index, rule) in self.rules.iter().enumerate() {
            let target = rule.target.name();
            if !names.contains(target) && !is_sentinel(target) {
                result.add_error(ValidationError::DanglingTarget {
                    rule_index: index,
                    target: target.to_string(),
                });
            }
            if rule.is_final() {
                saw_final = true;
                if index != last {
                    result.add_error(ValidationError::MisplacedFinalRule { rule_index: index });
                }
            }
        }

        if !saw_final {
            result.add_error(ValidationError::MissingFinalRule);
        }
    }
}
