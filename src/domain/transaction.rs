use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a transaction is rejected before any scoring happens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("transaction value must be positive, got {0}")]
    NonPositiveValue(Decimal),
}

/// Attributes of a transaction as submitted for analysis.
///
/// Nothing here is trusted until [`TransactionAttributes::validate`] passes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransactionAttributes {
    /// Customer identifier (CPF)
    pub customer_id: String,

    /// Source IP address
    pub ip: String,

    /// Device fingerprint identifier
    pub device_id: String,

    /// Transaction category, e.g. "PIX" or "TED"
    pub tx_type: String,

    /// Monetary value; `None` when the caller omitted it
    pub tx_value: Option<Decimal>,
}

impl TransactionAttributes {
    pub fn new(
        customer_id: impl Into<String>,
        ip: impl Into<String>,
        device_id: impl Into<String>,
        tx_type: impl Into<String>,
        tx_value: Decimal,
    ) -> Self {
        TransactionAttributes {
            customer_id: customer_id.into(),
            ip: ip.into(),
            device_id: device_id.into(),
            tx_type: tx_type.into(),
            tx_value: Some(tx_value),
        }
    }

    /// Full request validation: every identifier present, value positive.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("customer id", &self.customer_id)?;
        require("ip", &self.ip)?;
        require("device id", &self.device_id)?;
        self.validate_for_scoring()
    }

    /// The narrower precondition for scoring: a type and a positive value.
    pub fn validate_for_scoring(&self) -> Result<(), ValidationError> {
        require("transaction type", &self.tx_type)?;
        self.positive_value().map(|_| ())
    }

    /// The transaction value, if present and strictly positive.
    pub fn positive_value(&self) -> Result<Decimal, ValidationError> {
        match self.tx_value {
            None => Err(ValidationError::MissingField("transaction value")),
            Some(v) if v <= Decimal::ZERO => Err(ValidationError::NonPositiveValue(v)),
            Some(v) => Ok(v),
        }
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

/// Membership of a transaction's identifiers in the screening lists.
///
/// The four flags are independent facts. A customer listed as both
/// permissive and restrictive is reported as such.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListFlags {
    pub customer_permissive: bool,
    pub customer_restrictive: bool,
    pub ip_restrictive: bool,
    pub device_restrictive: bool,
}

impl ListFlags {
    /// Flags used when list data is unavailable (fail-open).
    pub fn none() -> Self {
        ListFlags::default()
    }

    /// Returns true if any restrictive list matched.
    pub fn any_restrictive(&self) -> bool {
        self.customer_restrictive || self.ip_restrictive || self.device_restrictive
    }
}

/// Unit of work threaded through the scoring pipeline.
///
/// Built once per request. `flags` is `None` when the context was
/// assembled without list data; list conditions then never match.
#[derive(Debug, Clone)]
pub struct TransactionContext {
    pub attributes: TransactionAttributes,
    pub flags: Option<ListFlags>,
}

impl TransactionContext {
    pub fn new(attributes: TransactionAttributes, flags: ListFlags) -> Self {
        TransactionContext {
            attributes,
            flags: Some(flags),
        }
    }

    /// Context with no list data attached.
    pub fn without_lists(attributes: TransactionAttributes) -> Self {
        TransactionContext {
            attributes,
            flags: None,
        }
    }

    /// Read a single list flag, treating missing list data as `false`.
    #[inline]
    pub fn flag(&self, read: impl Fn(&ListFlags) -> bool) -> bool {
        self.flags.as_ref().map(read).unwrap_or(false)
    }

    #[inline]
    pub fn tx_type(&self) -> &str {
        &self.attributes.tx_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(value: Option<Decimal>) -> TransactionAttributes {
        TransactionAttributes {
            customer_id: "12345678900".to_string(),
            ip: "10.0.0.1".to_string(),
            device_id: "dev-1".to_string(),
            tx_type: "PIX".to_string(),
            tx_value: value,
        }
    }

    #[test]
    fn test_valid_attributes() {
        assert!(attrs(Some(Decimal::new(10050, 2))).validate().is_ok());
    }

    #[test]
    fn test_missing_or_non_positive_value() {
        assert_eq!(
            attrs(None).validate(),
            Err(ValidationError::MissingField("transaction value"))
        );
        assert_eq!(
            attrs(Some(Decimal::ZERO)).validate(),
            Err(ValidationError::NonPositiveValue(Decimal::ZERO))
        );
        assert!(attrs(Some(Decimal::new(-1, 0))).validate().is_err());
    }

    #[test]
    fn test_blank_identifiers_rejected() {
        let mut a = attrs(Some(Decimal::ONE));
        a.device_id = "   ".to_string();
        assert_eq!(a.validate(), Err(ValidationError::MissingField("device id")));

        // Scoring only cares about type and value
        assert!(a.validate_for_scoring().is_ok());

        a.tx_type = String::new();
        assert!(a.validate_for_scoring().is_err());
    }

    #[test]
    fn test_context_without_lists_reads_false() {
        let ctx = TransactionContext::without_lists(attrs(Some(Decimal::ONE)));
        assert!(!ctx.flag(|f| f.customer_restrictive));

        let flags = ListFlags {
            customer_restrictive: true,
            ..ListFlags::none()
        };
        let ctx = TransactionContext::new(attrs(Some(Decimal::ONE)), flags);
        assert!(ctx.flag(|f| f.customer_restrictive));
        assert!(flags.any_restrictive());
    }
}
