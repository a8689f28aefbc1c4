//! External payment gateway integration.
//!
//! The gateway is redirect-based: the customer is sent to a hosted page
//! with signed success/failure callback URLs, and the gateway later calls
//! back with a reference ID. Callbacks are never trusted on their own;
//! the engine confirms every one with a server-to-server verification
//! call through [`PaymentGateway`].

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::OrderId;
use domain::{CommerceError, Money, Result};
use reqwest::Url;

/// Gateway connection settings, loaded from the environment by the API
/// layer.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Hosted payment page the customer is redirected to.
    pub pay_url: String,

    /// Server-to-server verification endpoint.
    pub verify_url: String,

    /// Merchant code issued by the gateway.
    pub merchant_code: String,

    /// Customer-facing success callback URL.
    pub success_url: String,

    /// Customer-facing failure callback URL.
    pub failure_url: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            pay_url: "https://uat.gateway.example/epay/main".to_string(),
            verify_url: "https://uat.gateway.example/epay/transrec".to_string(),
            merchant_code: "MERCHANT-TEST".to_string(),
            success_url: "http://localhost:3000/payment/success".to_string(),
            failure_url: "http://localhost:3000/payment/failure".to_string(),
        }
    }
}

impl GatewayConfig {
    /// Builds the outbound redirect URL for an order, encoding the amount,
    /// merchant code, order reference, and callback URLs.
    pub fn redirect_url(&self, order_id: OrderId, amount: Money) -> Result<String> {
        let oid = order_id.to_string();
        let success = Url::parse_with_params(&self.success_url, [("oid", oid.as_str())])
            .map_err(|e| CommerceError::Gateway(format!("bad success URL: {e}")))?;
        let failure = Url::parse_with_params(&self.failure_url, [("oid", oid.as_str())])
            .map_err(|e| CommerceError::Gateway(format!("bad failure URL: {e}")))?;

        let url = Url::parse_with_params(
            &self.pay_url,
            [
                ("amt", format_amount(amount).as_str()),
                ("scd", self.merchant_code.as_str()),
                ("pid", oid.as_str()),
                ("su", success.as_str()),
                ("fu", failure.as_str()),
            ],
        )
        .map_err(|e| CommerceError::Gateway(format!("bad pay URL: {e}")))?;

        Ok(url.into())
    }
}

/// Amounts cross the wire as decimal strings.
fn format_amount(amount: Money) -> String {
    let cents = amount.cents();
    format!("{}.{:02}", cents / 100, (cents % 100).abs())
}

/// What the engine asks the gateway to confirm.
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    /// Amount the callback claims was paid.
    pub amount: Money,

    /// Merchant code, echoed back for the gateway's own matching.
    pub merchant_code: String,

    /// Reference ID supplied by the gateway in the callback.
    pub gateway_ref: String,

    /// Our order reference the payment was initiated with.
    pub order_ref: OrderId,
}

/// Definitive answer from the verification endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayVerdict {
    /// The gateway acknowledged the transaction.
    Verified,

    /// Anything other than an explicit success acknowledgment.
    Rejected(String),
}

/// Server-to-server verification client.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Confirms a callback with the gateway. One bounded round trip;
    /// transport faults surface as `CommerceError::Gateway` and leave the
    /// payment untouched.
    async fn verify_transaction(&self, request: VerificationRequest) -> Result<GatewayVerdict>;
}

/// HTTP client for the real verification endpoint.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    config: GatewayConfig,
    http: reqwest::Client,
}

impl HttpGateway {
    /// Creates a client from the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpGateway {
    async fn verify_transaction(&self, request: VerificationRequest) -> Result<GatewayVerdict> {
        let response = self
            .http
            .get(&self.config.verify_url)
            .query(&[
                ("amt", format_amount(request.amount)),
                ("scd", request.merchant_code),
                ("rid", request.gateway_ref),
                ("pid", request.order_ref.to_string()),
            ])
            .send()
            .await
            .map_err(|e| CommerceError::Gateway(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CommerceError::Gateway(format!(
                "verification endpoint returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CommerceError::Gateway(e.to_string()))?;

        // The gateway answers with a bare success token; anything else
        // means the transaction is not acknowledged.
        if body.trim().eq_ignore_ascii_case("success") {
            Ok(GatewayVerdict::Verified)
        } else {
            Ok(GatewayVerdict::Rejected(format!(
                "gateway did not acknowledge transaction: {}",
                body.trim()
            )))
        }
    }
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    reject_with: Option<String>,
    transport_error: bool,
    calls: u32,
}

/// In-memory gateway for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryGateway {
    /// Creates a gateway that verifies everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent verifications come back rejected.
    pub fn set_reject(&self, reason: impl Into<String>) {
        self.state.write().unwrap().reject_with = Some(reason.into());
    }

    /// Makes subsequent verifications fail at the transport level.
    pub fn set_transport_error(&self, fail: bool) {
        self.state.write().unwrap().transport_error = fail;
    }

    /// Returns how many verification calls were made.
    pub fn call_count(&self) -> u32 {
        self.state.read().unwrap().calls
    }
}

#[async_trait]
impl PaymentGateway for InMemoryGateway {
    async fn verify_transaction(&self, _request: VerificationRequest) -> Result<GatewayVerdict> {
        let mut state = self.state.write().unwrap();
        state.calls += 1;

        if state.transport_error {
            return Err(CommerceError::Gateway("connection refused".to_string()));
        }

        match &state.reject_with {
            Some(reason) => Ok(GatewayVerdict::Rejected(reason.clone())),
            None => Ok(GatewayVerdict::Verified),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_url_encodes_callbacks_and_amount() {
        let config = GatewayConfig::default();
        let order_id = OrderId::new();
        let url = config.redirect_url(order_id, Money::from_cents(2050)).unwrap();

        assert!(url.starts_with("https://uat.gateway.example/epay/main?"));
        assert!(url.contains("amt=20.50"));
        assert!(url.contains("scd=MERCHANT-TEST"));
        assert!(url.contains(&format!("pid={order_id}")));
        // Callback URLs are percent-encoded into the query string.
        assert!(url.contains("su=http%3A%2F%2Flocalhost%3A3000%2Fpayment%2Fsuccess"));
    }

    #[test]
    fn amount_formatting() {
        assert_eq!(format_amount(Money::from_cents(2000)), "20.00");
        assert_eq!(format_amount(Money::from_cents(5)), "0.05");
        assert_eq!(format_amount(Money::from_cents(1999)), "19.99");
    }

    #[tokio::test]
    async fn in_memory_gateway_verdicts() {
        let gateway = InMemoryGateway::new();
        let request = VerificationRequest {
            amount: Money::from_cents(2000),
            merchant_code: "MERCHANT-TEST".to_string(),
            gateway_ref: "GW-1".to_string(),
            order_ref: OrderId::new(),
        };

        assert_eq!(
            gateway.verify_transaction(request.clone()).await.unwrap(),
            GatewayVerdict::Verified
        );

        gateway.set_reject("no such transaction");
        assert!(matches!(
            gateway.verify_transaction(request.clone()).await.unwrap(),
            GatewayVerdict::Rejected(_)
        ));

        gateway.set_transport_error(true);
        assert!(matches!(
            gateway.verify_transaction(request).await,
            Err(CommerceError::Gateway(_))
        ));
        assert_eq!(gateway.call_count(), 3);
    }
}
