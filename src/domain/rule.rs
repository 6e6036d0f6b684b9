use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};
use std::fmt;

/// Transaction type of rules that apply to every transaction.
pub const DEFAULT_TX_TYPE: &str = "DEFAULT";

/// Rule identifier, assigned by the rule store and never changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(pub i64);

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Set of transaction types a rule query is restricted to.
///
/// Almost always exactly `{DEFAULT, <tx type>}`.
pub type TxTypeSet = SmallVec<[String; 2]>;

/// Types whose rules apply to a transaction of `tx_type`.
pub fn applicable_tx_types(tx_type: &str) -> TxTypeSet {
    if tx_type == DEFAULT_TX_TYPE {
        smallvec![DEFAULT_TX_TYPE.to_string()]
    } else {
        smallvec![DEFAULT_TX_TYPE.to_string(), tx_type.to_string()]
    }
}

/// Operator-defined scoring rule.
///
/// The condition is kept in its stored form; only the rule evaluator
/// interprets it, so a malformed condition can sit in the store without
/// breaking anything but its own rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,

    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Transaction type the rule applies to, or `DEFAULT`
    pub tx_type: String,

    /// Stored condition: a JSON object with a `type` discriminator, or a
    /// string holding that object
    pub condition: serde_json::Value,

    /// Contribution to the score when the condition holds; may be negative
    pub points: i32,

    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Rule {
    /// Returns true if the rule applies to every transaction type.
    #[inline]
    pub fn is_default(&self) -> bool {
        self.tx_type == DEFAULT_TX_TYPE
    }

    /// Returns true if the rule is selected for a transaction of `tx_type`.
    ///
    /// Activation is checked separately.
    #[inline]
    pub fn applies_to(&self, tx_type: &str) -> bool {
        self.is_default() || self.tx_type == tx_type
    }
}
