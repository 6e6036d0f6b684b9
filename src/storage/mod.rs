pub mod mock;
pub mod postgres;
pub mod traits;

pub use mock::MockRuleStore;
pub use postgres::PostgresRuleStore;
pub use traits::{PolicyRuleStore, RuleStore};
