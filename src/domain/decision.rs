use serde::{Deserialize, Serialize};
use std::fmt;

/// Final risk decision for a transaction.
///
/// There is no pending state: every analysis resolves to one of these two,
/// and every failure path resolves to `Denied`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    /// Transaction may proceed
    Approved,
    /// Transaction is refused
    Denied,
}

impl Decision {
    /// Returns true if this decision lets the transaction through.
    #[inline]
    pub fn is_approved(&self) -> bool {
        *self == Decision::Approved
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approved => "Approved",
            Decision::Denied => "Denied",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
