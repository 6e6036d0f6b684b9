pub mod decision;
pub mod policy;
pub mod rule;
pub mod score;
pub mod transaction;

pub use decision::Decision;
pub use policy::ScoringPolicy;
pub use rule::{applicable_tx_types, Rule, RuleId, TxTypeSet, DEFAULT_TX_TYPE};
pub use score::RiskScore;
pub use transaction::{ListFlags, TransactionAttributes, TransactionContext, ValidationError};
