use serde::{Deserialize, Serialize};

use super::rule::Rule;

/// Versioned set of scoring rules, as published by operators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringPolicy {
    /// Policy version identifier
    #[serde(rename = "policy_version")]
    pub version: String,

    /// Rule definitions
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl ScoringPolicy {
    /// Create an empty policy.
    pub fn empty() -> Self {
        ScoringPolicy {
            version: "0.0.0".to_string(),
            rules: Vec::new(),
        }
    }

    /// Active rules whose type is one of `tx_types`.
    pub fn active_rules_for<'a>(&'a self, tx_types: &'a [String]) -> impl Iterator<Item = &'a Rule> {
        self.rules
            .iter()
            .filter(move |r| r.active && tx_types.iter().any(|t| *t == r.tx_type))
    }

    pub fn active_count(&self) -> usize {
        self.rules.iter().filter(|r| r.active).count()
    }
}
