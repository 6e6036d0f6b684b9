use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregated risk score for a transaction.
///
/// A score produced by rule evaluation is never below [`RiskScore::FLOOR`];
/// zero would be indistinguishable from "nothing was evaluated".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskScore(u32);

impl RiskScore {
    /// Minimum score once a rule set has been evaluated.
    pub const FLOOR: u32 = 1;

    /// Wrap a score reported by a scoring service as-is.
    pub fn new(score: u32) -> Self {
        RiskScore(score)
    }

    /// Build a score from a raw point total, clamping to the floor.
    ///
    /// Totals can be negative because rule points can be negative.
    pub fn from_total(total: i64) -> Self {
        let clamped = total.clamp(Self::FLOOR as i64, u32::MAX as i64);
        RiskScore(clamped as u32)
    }

    #[inline]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Returns true when the score is strictly above the threshold.
    #[inline]
    pub fn is_high_risk(&self, threshold: u32) -> bool {
        self.0 > threshold
    }
}

impl fmt::Display for RiskScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_total_clamps_to_floor() {
        assert_eq!(RiskScore::from_total(0).value(), 1);
        assert_eq!(RiskScore::from_total(-250).value(), 1);
        assert_eq!(RiskScore::from_total(850).value(), 850);
    }

    #[test]
    fn test_from_total_saturates() {
        assert_eq!(RiskScore::from_total(i64::MAX).value(), u32::MAX);
    }

    #[test]
    fn test_high_risk_is_strict() {
        assert!(!RiskScore::new(699).is_high_risk(699));
        assert!(RiskScore::new(700).is_high_risk(699));
    }
}
