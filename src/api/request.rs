use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{ListFlags, TransactionAttributes};

/// Body of `POST /risk-analysis`.
///
/// Every field defaults so that a request with missing data reaches
/// validation and is denied there, instead of failing to deserialize.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAnalysisRequest {
    #[serde(default)]
    pub cpf: String,

    #[serde(default)]
    pub ip: String,

    #[serde(default)]
    pub device_id: String,

    #[serde(default)]
    pub tx_type: String,

    /// Exact decimal, as a JSON number or string
    #[serde(default)]
    pub tx_value: Option<Decimal>,
}

impl RiskAnalysisRequest {
    pub fn to_attributes(&self) -> TransactionAttributes {
        TransactionAttributes {
            customer_id: self.cpf.clone(),
            ip: self.ip.clone(),
            device_id: self.device_id.clone(),
            tx_type: self.tx_type.clone(),
            tx_value: self.tx_value,
        }
    }
}

/// Body of `POST /lists/check`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListsCheckRequest {
    #[serde(default)]
    pub cpf: String,

    #[serde(default)]
    pub ip: String,

    #[serde(default)]
    pub device_id: String,
}

impl ListsCheckRequest {
    pub fn from_attributes(attributes: &TransactionAttributes) -> Self {
        ListsCheckRequest {
            cpf: attributes.customer_id.clone(),
            ip: attributes.ip.clone(),
            device_id: attributes.device_id.clone(),
        }
    }

    /// Name of the first blank identifier, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.cpf.trim().is_empty() {
            Some("cpf")
        } else if self.ip.trim().is_empty() {
            Some("ip")
        } else if self.device_id.trim().is_empty() {
            Some("deviceId")
        } else {
            None
        }
    }
}

/// Body of `POST /decision-engine/calculate-score`: the transaction with
/// its list flags already resolved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRequest {
    #[serde(default)]
    pub cpf: String,

    #[serde(default)]
    pub ip: String,

    #[serde(default)]
    pub device_id: String,

    #[serde(default)]
    pub tx_type: String,

    #[serde(default)]
    pub tx_value: Option<Decimal>,

    #[serde(default)]
    pub cpf_in_permissive_list: bool,

    #[serde(default)]
    pub cpf_in_restrictive_list: bool,

    #[serde(default)]
    pub ip_in_restrictive_list: bool,

    #[serde(default)]
    pub device_id_in_restrictive_list: bool,
}

impl ScoreRequest {
    pub fn new(attributes: &TransactionAttributes, flags: ListFlags) -> Self {
        ScoreRequest {
            cpf: attributes.customer_id.clone(),
            ip: attributes.ip.clone(),
            device_id: attributes.device_id.clone(),
            tx_type: attributes.tx_type.clone(),
            tx_value: attributes.tx_value,
            cpf_in_permissive_list: flags.customer_permissive,
            cpf_in_restrictive_list: flags.customer_restrictive,
            ip_in_restrictive_list: flags.ip_restrictive,
            device_id_in_restrictive_list: flags.device_restrictive,
        }
    }

    pub fn to_attributes(&self) -> TransactionAttributes {
        TransactionAttributes {
            customer_id: self.cpf.clone(),
            ip: self.ip.clone(),
            device_id: self.device_id.clone(),
            tx_type: self.tx_type.clone(),
            tx_value: self.tx_value,
        }
    }

    pub fn flags(&self) -> ListFlags {
        ListFlags {
            customer_permissive: self.cpf_in_permissive_list,
            customer_restrictive: self.cpf_in_restrictive_list,
            ip_restrictive: self.ip_in_restrictive_list,
            device_restrictive: self.device_id_in_restrictive_list,
        }
    }
}

/// Query of `GET /auth/token`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenQuery {
    pub client_id: String,
}
