use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::models::WebhookLog;

/// Gateway callback body. Every field is optional because the raw payload is
/// logged before it is validated.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct WebhookPayload {
    pub status: Option<i32>,
    pub order_info: Option<OrderInfo>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct OrderInfo {
    pub order_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub order_amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub transaction_amount: Option<f64>,
    pub gateway: Option<String>,
    pub bank_reference: Option<String>,
    pub status: Option<String>,
    pub payment_mode: Option<String>,
    // The gateway misspells this field.
    #[serde(rename = "payemnt_details", alias = "payment_details")]
    pub payment_details: Option<String>,
    #[serde(rename = "Payment_message", alias = "payment_message")]
    pub payment_message: Option<String>,
    pub payment_time: Option<String>,
    pub error_message: Option<String>,
}

/// Amounts arrive either as JSON numbers or as numeric strings.
fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Number(f64),
        Text(String),
    }

    match Option::<Amount>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Amount::Number(n)) => Ok(Some(n)),
        Some(Amount::Text(t)) if t.trim().is_empty() => Ok(None),
        Some(Amount::Text(t)) => t
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid amount {t:?}"))),
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookAck {
    pub processed: bool,
    pub order_id: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookLogList {
    pub items: Vec<WebhookLog>,
}
