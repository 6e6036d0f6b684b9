use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

use crate::domain::ScoringPolicy;
use crate::rules::Condition;

/// Errors that can occur during policy loading.
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Load a scoring policy from a YAML file.
pub fn load_policy(path: impl AsRef<Path>) -> Result<ScoringPolicy, PolicyError> {
    let content = fs::read_to_string(path)?;
    let policy: ScoringPolicy = serde_yaml::from_str(&content)?;

    validate_policy(&policy)?;
    warn_unreadable_conditions(&policy);

    Ok(policy)
}

/// Validate policy structure.
///
/// Conditions are deliberately not validated here: a rule with an
/// unreadable condition is skipped at evaluation time instead of
/// rejecting the whole policy.
fn validate_policy(policy: &ScoringPolicy) -> Result<(), PolicyError> {
    if policy.version.trim().is_empty() {
        return Err(PolicyError::Validation(
            "Policy version cannot be empty".to_string(),
        ));
    }

    let mut seen_ids = HashSet::new();
    for rule in &policy.rules {
        if !seen_ids.insert(rule.id) {
            return Err(PolicyError::Validation(format!(
                "Duplicate rule ID: {}",
                rule.id
            )));
        }

        if rule.name.trim().is_empty() {
            return Err(PolicyError::Validation(format!(
                "Rule {} has an empty name",
                rule.id
            )));
        }

        if rule.tx_type.trim().is_empty() {
            return Err(PolicyError::Validation(format!(
                "Rule {} has an empty tx_type",
                rule.id
            )));
        }
    }

    Ok(())
}

fn warn_unreadable_conditions(policy: &ScoringPolicy) {
    for rule in &policy.rules {
        match Condition::parse(&rule.condition) {
            Ok(Condition::Unknown(kind)) => {
                warn!(rule_id = %rule.id, kind = %kind, "Rule has an unknown condition type and will never match");
            }
            Ok(_) => {}
            Err(e) => {
                warn!(rule_id = %rule.id, error = %e, "Rule condition is unreadable and will be skipped");
            }
        }
    }
}

/// Loads the scoring policy from a fixed path.
#[derive(Debug, Clone)]
pub struct PolicyLoader {
    policy_path: String,
}

impl PolicyLoader {
    /// Create a new policy loader.
    pub fn new(policy_path: impl Into<String>) -> Self {
        PolicyLoader {
            policy_path: policy_path.into(),
        }
    }

    pub fn load(&self) -> Result<ScoringPolicy, PolicyError> {
        load_policy(&self.policy_path)
    }

    /// Get the policy file path.
    pub fn policy_path(&self) -> &str {
        &self.policy_path
    }
}
