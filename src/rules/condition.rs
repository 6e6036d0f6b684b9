use rust_decimal::Decimal;
use serde_json::{json, Map, Value};
use std::fmt;
use thiserror::Error;

use crate::domain::TransactionContext;

/// Errors raised while reading a stored condition.
///
/// Any of these makes the owning rule contribute nothing; they never abort
/// evaluation of other rules.
#[derive(Error, Debug)]
pub enum ConditionError {
    #[error("condition is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("condition must be a JSON object")]
    NotAnObject,

    #[error("condition has no string `type` field")]
    MissingType,

    #[error("`{kind}` condition is missing field `{field}`")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    #[error("field `{field}` is not an exact decimal: {value}")]
    InvalidDecimal { field: &'static str, value: String },
}

/// Predicate attached to a rule.
///
/// Stored as a JSON object discriminated by `type`. Unrecognized types
/// parse to [`Condition::Unknown`], which is never satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Transaction value within `[min, max]`, both ends inclusive
    ValueRange { min: Decimal, max: Decimal },
    /// Customer on the permissive list
    CpfPermissiveList,
    /// Customer on the restrictive list
    CpfRestrictiveList,
    /// Source IP on the restrictive list
    IpRestrictiveList,
    /// Device on the restrictive list
    DeviceRestrictiveList,
    /// A `type` this build does not recognize
    Unknown(String),
}

impl Condition {
    pub const VALUE_RANGE: &'static str = "value_range";
    pub const CPF_PERMISSIVE_LIST: &'static str = "cpf_permissive_list";
    pub const CPF_RESTRICTIVE_LIST: &'static str = "cpf_restrictive_list";
    pub const IP_RESTRICTIVE_LIST: &'static str = "ip_restrictive_list";
    pub const DEVICE_RESTRICTIVE_LIST: &'static str = "device_restrictive_list";

    /// Parse a stored condition.
    ///
    /// Accepts the JSON object itself or a string containing it (the form
    /// conditions take in a text column).
    pub fn parse(raw: &Value) -> Result<Self, ConditionError> {
        match raw {
            Value::Object(map) => Self::from_object(map),
            Value::String(text) => match serde_json::from_str::<Value>(text)? {
                Value::Object(map) => Self::from_object(&map),
                _ => Err(ConditionError::NotAnObject),
            },
            _ => Err(ConditionError::NotAnObject),
        }
    }

    fn from_object(map: &Map<String, Value>) -> Result<Self, ConditionError> {
        let kind = map
            .get("type")
            .and_then(Value::as_str)
            .ok_or(ConditionError::MissingType)?;

        let condition = match kind {
            Self::VALUE_RANGE => Condition::ValueRange {
                min: decimal_field(map, Self::VALUE_RANGE, "min")?,
                max: decimal_field(map, Self::VALUE_RANGE, "max")?,
            },
            Self::CPF_PERMISSIVE_LIST => Condition::CpfPermissiveList,
            Self::CPF_RESTRICTIVE_LIST => Condition::CpfRestrictiveList,
            Self::IP_RESTRICTIVE_LIST => Condition::IpRestrictiveList,
            Self::DEVICE_RESTRICTIVE_LIST => Condition::DeviceRestrictiveList,
            other => Condition::Unknown(other.to_string()),
        };

        Ok(condition)
    }

    /// Evaluate against a transaction context.
    ///
    /// List conditions read `false` when the context carries no list data.
    pub fn evaluate(&self, ctx: &TransactionContext) -> bool {
        match self {
            Condition::ValueRange { min, max } => match ctx.attributes.tx_value {
                Some(value) => *min <= value && value <= *max,
                None => false,
            },
            Condition::CpfPermissiveList => ctx.flag(|f| f.customer_permissive),
            Condition::CpfRestrictiveList => ctx.flag(|f| f.customer_restrictive),
            Condition::IpRestrictiveList => ctx.flag(|f| f.ip_restrictive),
            Condition::DeviceRestrictiveList => ctx.flag(|f| f.device_restrictive),
            Condition::Unknown(_) => false,
        }
    }

    /// The `type` discriminator of this condition.
    pub fn kind(&self) -> &str {
        match self {
            Condition::ValueRange { .. } => Self::VALUE_RANGE,
            Condition::CpfPermissiveList => Self::CPF_PERMISSIVE_LIST,
            Condition::CpfRestrictiveList => Self::CPF_RESTRICTIVE_LIST,
            Condition::IpRestrictiveList => Self::IP_RESTRICTIVE_LIST,
            Condition::DeviceRestrictiveList => Self::DEVICE_RESTRICTIVE_LIST,
            Condition::Unknown(kind) => kind.as_str(),
        }
    }

    /// Storage form. Decimal bounds are written as strings to keep them exact.
    pub fn to_value(&self) -> Value {
        match self {
            Condition::ValueRange { min, max } => json!({
                "type": Self::VALUE_RANGE,
                "min": min.to_string(),
                "max": max.to_string(),
            }),
            other => json!({ "type": other.kind() }),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::ValueRange { min, max } => write!(f, "value_range[{}, {}]", min, max),
            other => f.write_str(other.kind()),
        }
    }
}

/// Read a decimal bound given as a JSON string or number, without going
/// through floating point.
fn decimal_field(
    map: &Map<String, Value>,
    kind: &'static str,
    field: &'static str,
) -> Result<Decimal, ConditionError> {
    let text = match map.get(field) {
        Some(Value::String(s)) => s.trim().to_string(),
        // Keeps the source digits with arbitrary_precision enabled
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => {
            return Err(ConditionError::InvalidDecimal {
                field,
                value: other.to_string(),
            })
        }
        None => return Err(ConditionError::MissingField { kind, field }),
    };

    Decimal::from_str_exact(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| ConditionError::InvalidDecimal { field, value: text })
}
