//! MoMo e-wallet gateway (API v2, captureWallet)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::models::PaymentMethod;

use super::{PaymentError, PaymentGateway, PaymentLinkRequest, PaymentNotification, sign_hex, verify_hex};
use crate::core::MomoConfig;

const REQUEST_TYPE: &str = "captureWallet";

#[derive(Debug, Clone)]
pub struct MomoGateway {
    client: reqwest::Client,
    config: MomoConfig,
    ipn_url: String,
    redirect_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePaymentBody<'a> {
    partner_code: &'a str,
    request_id: &'a str,
    amount: i64,
    order_id: &'a str,
    order_info: &'a str,
    redirect_url: &'a str,
    ipn_url: &'a str,
    request_type: &'a str,
    extra_data: &'a str,
    lang: &'a str,
    signature: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePaymentResponse {
    result_code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    pay_url: Option<String>,
}

/// IPN body posted by MoMo
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpnBody {
    partner_code: String,
    order_id: String,
    request_id: String,
    amount: i64,
    #[serde(default)]
    order_info: String,
    #[serde(default)]
    order_type: String,
    trans_id: i64,
    result_code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    pay_type: String,
    response_time: i64,
    #[serde(default)]
    extra_data: String,
    signature: String,
}

impl MomoGateway {
    pub fn new(
        client: reqwest::Client,
        config: MomoConfig,
        ipn_url: String,
        redirect_url: String,
    ) -> Self {
        Self {
            client,
            config,
            ipn_url,
            redirect_url,
        }
    }

    /// Raw string signed on create, fields in alphabetical order
    fn create_signature_payload(&self, request: &PaymentLinkRequest) -> String {
        format!(
            "accessKey={}&amount={}&extraData=&ipnUrl={}&orderId={}&orderInfo={}&partnerCode={}&redirectUrl={}&requestId={}&requestType={}",
            self.config.access_key,
            request.amount,
            self.ipn_url,
            request.payment_ref,
            request.description,
            self.config.partner_code,
            self.redirect_url,
            request.payment_ref,
            REQUEST_TYPE,
        )
    }

    fn ipn_signature_payload(&self, ipn: &IpnBody) -> String {
        format!(
            "accessKey={}&amount={}&extraData={}&message={}&orderId={}&orderInfo={}&orderType={}&partnerCode={}&payType={}&requestId={}&responseTime={}&resultCode={}&transId={}",
            self.config.access_key,
            ipn.amount,
            ipn.extra_data,
            ipn.message,
            ipn.order_id,
            ipn.order_info,
            ipn.order_type,
            ipn.partner_code,
            ipn.pay_type,
            ipn.request_id,
            ipn.response_time,
            ipn.result_code,
            ipn.trans_id,
        )
    }
}

#[async_trait]
impl PaymentGateway for MomoGateway {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Momo
    }

    async fn create_payment_link(
        &self,
        request: &PaymentLinkRequest,
    ) -> Result<String, PaymentError> {
        let signature = sign_hex(
            &self.config.secret_key,
            &self.create_signature_payload(request),
        )?;
        let body = CreatePaymentBody {
            partner_code: &self.config.partner_code,
            request_id: &request.payment_ref,
            amount: request.amount,
            order_id: &request.payment_ref,
            order_info: &request.description,
            redirect_url: &self.redirect_url,
            ipn_url: &self.ipn_url,
            request_type: REQUEST_TYPE,
            extra_data: "",
            lang: "vi",
            signature,
        };

        let resp: CreatePaymentResponse = self
            .client
            .post(&self.config.endpoint)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        match (resp.result_code, resp.pay_url) {
            (0, Some(url)) => Ok(url),
            (code, _) => {
                tracing::warn!(code, message = %resp.message, "MoMo create payment rejected");
                Err(PaymentError::Provider(format!(
                    "MoMo rejected payment ({code}): {}",
                    resp.message
                )))
            }
        }
    }

    fn parse_notification(&self, body: &[u8]) -> Result<PaymentNotification, PaymentError> {
        let ipn: IpnBody = serde_json::from_slice(body)
            .map_err(|e| PaymentError::Malformed(format!("Invalid MoMo IPN body: {e}")))?;

        verify_hex(
            &self.config.secret_key,
            &self.ipn_signature_payload(&ipn),
            &ipn.signature,
        )?;

        if ipn.partner_code != self.config.partner_code {
            tracing::warn!(partner_code = %ipn.partner_code, "MoMo IPN for another partner");
            return Err(PaymentError::Malformed(format!(
                "Unexpected MoMo partner code {}",
                ipn.partner_code
            )));
        }

        Ok(PaymentNotification {
            payment_ref: ipn.order_id,
            amount: ipn.amount,
            success: ipn.result_code == 0,
            transaction_id: Some(ipn.trans_id.to_string()),
            message: ipn.message,
        })
    }
}
