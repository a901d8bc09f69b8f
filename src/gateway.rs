//! Client for the payment gateway's collect-request API.
//!
//! Every request carries the merchant API key as a bearer token plus a `sign`
//! field: an HS256 JWT over the request parameters keyed with the PG key.

use std::time::Duration;

use jsonwebtoken::{EncodingKey, Header, encode};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
};

#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
    api_key: String,
    pg_key: String,
    school_id: String,
}

#[derive(Debug, Serialize)]
struct CollectSignClaims<'a> {
    school_id: &'a str,
    amount: &'a str,
    callback_url: &'a str,
}

#[derive(Debug, Serialize)]
struct StatusSignClaims<'a> {
    school_id: &'a str,
    collect_request_id: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateCollectRequest<'a> {
    school_id: &'a str,
    amount: &'a str,
    callback_url: &'a str,
    sign: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CollectRequest {
    #[serde(alias = "id")]
    pub collect_request_id: String,
    #[serde(
        rename = "Collect_request_url",
        alias = "collect_request_url",
        alias = "payment_url",
        alias = "redirect_url"
    )]
    pub payment_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CollectRequestStatus {
    pub status: String,
    pub amount: Option<f64>,
    pub details: Option<serde_json::Value>,
}

impl GatewayClient {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.gateway_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.payment_api_url.trim_end_matches('/').to_owned(),
            api_key: config.payment_api_key.clone(),
            pg_key: config.pg_key.clone(),
            school_id: config.school_id.clone(),
        })
    }

    pub async fn create_collect_request(
        &self,
        amount: f64,
        callback_url: &str,
    ) -> AppResult<CollectRequest> {
        let amount = amount.to_string();
        let sign = self.sign(&CollectSignClaims {
            school_id: &self.school_id,
            amount: &amount,
            callback_url,
        })?;

        let body = CreateCollectRequest {
            school_id: &self.school_id,
            amount: &amount,
            callback_url,
            sign,
        };

        let response = self
            .client
            .post(format!("{}/create-collect-request", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Gateway(e.to_string()))?;

        decode_response(response).await
    }

    pub async fn collect_request_status(
        &self,
        collect_request_id: &str,
    ) -> AppResult<CollectRequestStatus> {
        let sign = self.sign(&StatusSignClaims {
            school_id: &self.school_id,
            collect_request_id,
        })?;

        let url = Url::parse_with_params(
            &format!("{}/collect-request/{}", self.base_url, collect_request_id),
            &[("school_id", self.school_id.as_str()), ("sign", sign.as_str())],
        )
        .map_err(|e| AppError::Gateway(format!("invalid gateway url: {e}")))?;

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| AppError::Gateway(e.to_string()))?;

        decode_response(response).await
    }

    fn sign<T: Serialize>(&self, claims: &T) -> AppResult<String> {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(self.pg_key.as_bytes()),
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
    }
}

async fn decode_response<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> AppResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Gateway(format!("{status}: {body}")));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| AppError::Gateway(format!("unexpected response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_request_accepts_gateway_field_spellings() {
        let edviron: CollectRequest = serde_json::from_value(serde_json::json!({
            "collect_request_id": "6808bc4888e4e3c149e757f1",
            "Collect_request_url": "https://pay.example/collect/1"
        }))
        .unwrap();
        assert_eq!(edviron.payment_url, "https://pay.example/collect/1");

        let generic: CollectRequest = serde_json::from_value(serde_json::json!({
            "id": "abc",
            "payment_url": "https://pay.example/collect/2"
        }))
        .unwrap();
        assert_eq!(generic.collect_request_id, "abc");
        assert_eq!(generic.payment_url, "https://pay.example/collect/2");
    }
}
