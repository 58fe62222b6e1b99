//! 支付渠道
//!
//! - [`MomoGateway`] - MoMo 电子钱包 (captureWallet)
//! - [`PayOsGateway`] - PayOS 银行卡 / 转账
//!
//! 两个渠道都用 HMAC-SHA256 签名请求并校验回调。渠道失败不重试，
//! 统一映射为 `PaymentProviderError` (502)。

pub mod momo;
pub mod payos;

pub use momo::MomoGateway;
pub use payos::PayOsGateway;

use std::sync::Arc;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use shared::error::{AppError, ErrorCode};
use shared::models::PaymentMethod;
use thiserror::Error;

use crate::core::Config;

/// Checkout request handed to a provider
#[derive(Debug, Clone)]
pub struct PaymentLinkRequest {
    /// Unique reference of this payment attempt (numeric string)
    pub payment_ref: String,
    pub order_number: String,
    /// Amount in VND
    pub amount: i64,
    pub description: String,
}

/// Verified provider callback
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentNotification {
    pub payment_ref: String,
    pub amount: i64,
    pub success: bool,
    /// Provider side transaction id, if any
    pub transaction_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Invalid notification signature")]
    InvalidSignature,

    #[error("Malformed notification: {0}")]
    Malformed(String),

    #[error("Payment provider error: {0}")]
    Provider(String),
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::InvalidSignature => AppError::new(ErrorCode::PaymentSignatureInvalid),
            PaymentError::Malformed(msg) => AppError::invalid_request(msg),
            PaymentError::Provider(msg) => AppError::provider(msg),
        }
    }
}

impl From<reqwest::Error> for PaymentError {
    fn from(err: reqwest::Error) -> Self {
        PaymentError::Provider(err.to_string())
    }
}

/// 支付渠道接口
#[async_trait]
pub trait PaymentGateway: Send + Sync + std::fmt::Debug {
    /// Payment method served by this gateway
    fn method(&self) -> PaymentMethod;

    /// Ask the provider for a checkout URL
    async fn create_payment_link(&self, request: &PaymentLinkRequest)
    -> Result<String, PaymentError>;

    /// Verify the signature of a raw callback body and extract the result
    fn parse_notification(&self, body: &[u8]) -> Result<PaymentNotification, PaymentError>;
}

/// 非现金支付方式到渠道的映射
#[derive(Debug, Clone)]
pub struct PaymentGateways {
    momo: Arc<dyn PaymentGateway>,
    payos: Arc<dyn PaymentGateway>,
}

impl PaymentGateways {
    pub fn new(momo: Arc<dyn PaymentGateway>, payos: Arc<dyn PaymentGateway>) -> Self {
        Self { momo, payos }
    }

    /// Real provider clients built from configuration
    pub fn from_config(config: &Config) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self::new(
            Arc::new(MomoGateway::new(
                client.clone(),
                config.momo.clone(),
                config.momo_ipn_url(),
                config.payment_return_url.clone(),
            )),
            Arc::new(PayOsGateway::new(
                client,
                config.payos.clone(),
                config.payment_return_url.clone(),
                config.payment_cancel_url.clone(),
            )),
        ))
    }

    /// Gateway for a payment method; cash on delivery has none
    pub fn for_method(&self, method: PaymentMethod) -> Option<&Arc<dyn PaymentGateway>> {
        match method {
            PaymentMethod::CashOnDelivery => None,
            PaymentMethod::Momo => Some(&self.momo),
            PaymentMethod::PayOs => Some(&self.payos),
        }
    }
}

/// HMAC-SHA256 of `data`, lowercase hex
pub(crate) fn sign_hex(key: &str, data: &str) -> Result<String, PaymentError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key.as_bytes())
        .map_err(|_| PaymentError::Provider("HMAC key error".into()))?;
    mac.update(data.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time check of a hex HMAC-SHA256 signature
pub(crate) fn verify_hex(key: &str, data: &str, signature: &str) -> Result<(), PaymentError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key.as_bytes())
        .map_err(|_| PaymentError::InvalidSignature)?;
    mac.update(data.as_bytes());

    let sig_bytes = hex::decode(signature).map_err(|_| PaymentError::InvalidSignature)?;
    mac.verify_slice(&sig_bytes)
        .map_err(|_| PaymentError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let sig = sign_hex("secret", "amount=1000&orderId=1").unwrap();
        assert_eq!(sig.len(), 64);
        assert!(verify_hex("secret", "amount=1000&orderId=1", &sig).is_ok());
        assert!(verify_hex("secret", "amount=1001&orderId=1", &sig).is_err());
        assert!(verify_hex("other", "amount=1000&orderId=1", &sig).is_err());
        assert!(verify_hex("secret", "amount=1000&orderId=1", "zz").is_err());
    }

    #[test]
    fn test_known_hmac_vector() {
        // RFC 4231 test case 2
        let sig = sign_hex("Jefe", "what do ya want for nothing?").unwrap();
        assert_eq!(
            sig,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_error_mapping() {
        let err: AppError = PaymentError::InvalidSignature.into();
        assert_eq!(err.code, ErrorCode::PaymentSignatureInvalid);

        let err: AppError = PaymentError::Provider("timeout".into()).into();
        assert_eq!(err.code, ErrorCode::PaymentProviderError);
        assert_eq!(err.http_status(), http::StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_cash_has_no_gateway() {
        let gateways = PaymentGateways::from_config(&Config::default()).unwrap();
        assert!(gateways.for_method(PaymentMethod::CashOnDelivery).is_none());
        assert_eq!(
            gateways.for_method(PaymentMethod::Momo).map(|g| g.method()),
            Some(PaymentMethod::Momo)
        );
        assert_eq!(
            gateways.for_method(PaymentMethod::PayOs).map(|g| g.method()),
            Some(PaymentMethod::PayOs)
        );
    }
}
