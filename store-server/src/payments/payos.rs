//! PayOS gateway (card / bank transfer)
//!
//! PayOS only accepts integer order codes, so `payment_ref` is always a numeric string.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::models::PaymentMethod;

use super::{PaymentError, PaymentGateway, PaymentLinkRequest, PaymentNotification, sign_hex, verify_hex};
use crate::core::PayOsConfig;

/// PayOS rejects descriptions longer than this
const MAX_DESCRIPTION_LEN: usize = 25;

#[derive(Debug, Clone)]
pub struct PayOsGateway {
    client: reqwest::Client,
    config: PayOsConfig,
    return_url: String,
    cancel_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePaymentBody<'a> {
    order_code: i64,
    amount: i64,
    description: &'a str,
    cancel_url: &'a str,
    return_url: &'a str,
    signature: String,
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    code: String,
    #[serde(default)]
    desc: String,
    #[serde(default)]
    data: Option<CheckoutData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutData {
    checkout_url: String,
}

#[derive(Debug, Deserialize)]
struct WebhookBody {
    data: serde_json::Map<String, Value>,
    signature: String,
}

impl PayOsGateway {
    pub fn new(
        client: reqwest::Client,
        config: PayOsConfig,
        return_url: String,
        cancel_url: String,
    ) -> Self {
        Self {
            client,
            config,
            return_url,
            cancel_url,
        }
    }

    fn create_signature_payload(&self, order_code: i64, amount: i64, description: &str) -> String {
        format!(
            "amount={}&cancelUrl={}&description={}&orderCode={}&returnUrl={}",
            amount, self.cancel_url, description, order_code, self.return_url
        )
    }
}

/// `key=value` pairs of the webhook data, keys sorted, joined by `&`
fn data_signature_payload(data: &serde_json::Map<String, Value>) -> String {
    let sorted: BTreeMap<&String, &Value> = data.iter().collect();
    sorted
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, value_to_plain(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn value_to_plain(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Trim to the provider limit on a char boundary
fn short_description(description: &str) -> String {
    description.chars().take(MAX_DESCRIPTION_LEN).collect()
}

#[async_trait]
impl PaymentGateway for PayOsGateway {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::PayOs
    }

    async fn create_payment_link(
        &self,
        request: &PaymentLinkRequest,
    ) -> Result<String, PaymentError> {
        let order_code: i64 = request.payment_ref.parse().map_err(|_| {
            PaymentError::Provider(format!(
                "PayOS order code must be numeric, got {}",
                request.payment_ref
            ))
        })?;
        let description = short_description(&request.description);
        let signature = sign_hex(
            &self.config.checksum_key,
            &self.create_signature_payload(order_code, request.amount, &description),
        )?;

        let body = CreatePaymentBody {
            order_code,
            amount: request.amount,
            description: &description,
            cancel_url: &self.cancel_url,
            return_url: &self.return_url,
            signature,
        };

        let url = format!(
            "{}/v2/payment-requests",
            self.config.base_url.trim_end_matches('/')
        );
        let resp: ApiEnvelope = self
            .client
            .post(url)
            .header("x-client-id", &self.config.client_id)
            .header("x-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        match (resp.code.as_str(), resp.data) {
            ("00", Some(data)) => Ok(data.checkout_url),
            (code, _) => {
                tracing::warn!(code, desc = %resp.desc, "PayOS create payment rejected");
                Err(PaymentError::Provider(format!(
                    "PayOS rejected payment ({code}): {}",
                    resp.desc
                )))
            }
        }
    }

    fn parse_notification(&self, body: &[u8]) -> Result<PaymentNotification, PaymentError> {
        let webhook: WebhookBody = serde_json::from_slice(body)
            .map_err(|e| PaymentError::Malformed(format!("Invalid PayOS webhook body: {e}")))?;

        verify_hex(
            &self.config.checksum_key,
            &data_signature_payload(&webhook.data),
            &webhook.signature,
        )?;

        let data = &webhook.data;
        let order_code = data
            .get("orderCode")
            .and_then(Value::as_i64)
            .ok_or_else(|| PaymentError::Malformed("PayOS webhook missing orderCode".into()))?;
        let amount = data
            .get("amount")
            .and_then(Value::as_i64)
            .ok_or_else(|| PaymentError::Malformed("PayOS webhook missing amount".into()))?;
        let code = data.get("code").and_then(Value::as_str).unwrap_or_default();

        Ok(PaymentNotification {
            payment_ref: order_code.to_string(),
            amount,
            success: code == "00",
            transaction_id: data
                .get("reference")
                .and_then(Value::as_str)
                .map(String::from),
            message: data
                .get("desc")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }
}
