//! Payment initiation and verification.
//!
//! Two-phase flow for gateway payments: `initiate` records a `Pending`
//! payment and hands back a redirect URL; `verify` confirms the gateway
//! callback server-to-server and settles the record exactly once.
//! Offline methods (cash on delivery, bank transfer) skip the gateway;
//! their payments are settled by staff action, and the engine never
//! moves the order for them.

use common::OrderId;
use domain::{
    CommerceError, Money, OrderStatus, Payment, PaymentMethod, PaymentStatus, Result,
    TransactionId,
};
use serde::Serialize;
use store::{OrderStore, PaymentStore};

use crate::gateway::{GatewayConfig, GatewayVerdict, PaymentGateway, VerificationRequest};

/// Result of initiating a payment.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentInitiation {
    pub transaction_id: TransactionId,
    pub status: PaymentStatus,
    /// Redirect URL for gateway payments; `None` for offline methods.
    pub payment_url: Option<String>,
    pub message: String,
}

/// Result of verifying a payment. A failed verification is an outcome,
/// not an error.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentOutcome {
    pub transaction_id: TransactionId,
    pub status: PaymentStatus,
    pub message: String,
}

/// Drives payments from initiation through settlement.
pub struct PaymentEngine<PS, OS, G> {
    payments: PS,
    orders: OS,
    gateway: G,
    config: GatewayConfig,
}

impl<PS, OS, G> PaymentEngine<PS, OS, G>
where
    PS: PaymentStore,
    OS: OrderStore,
    G: PaymentGateway,
{
    /// Creates an engine over the given stores and gateway client.
    pub fn new(payments: PS, orders: OS, gateway: G, config: GatewayConfig) -> Self {
        Self {
            payments,
            orders,
            gateway,
            config,
        }
    }

    /// Initiates payment for an order.
    ///
    /// The claimed amount must match the order total exactly; a mismatch
    /// is rejected before any record is written. Re-initiating while a
    /// payment is pending returns the existing transaction instead of
    /// minting a second one.
    #[tracing::instrument(skip(self))]
    pub async fn initiate(
        &self,
        order_id: OrderId,
        method: PaymentMethod,
        claimed_amount: Money,
    ) -> Result<PaymentInitiation> {
        let order = self
            .orders
            .get(order_id)
            .await
            .ok_or_else(|| CommerceError::not_found("order", order_id))?;

        if claimed_amount != order.total_amount() {
            return Err(CommerceError::AmountMismatch {
                expected: order.total_amount(),
                claimed: claimed_amount,
            });
        }

        if let Some(existing) = self.payments.get_by_order(order_id).await {
            return Ok(self.describe_existing(&existing));
        }

        let payment = Payment::new(order_id, order.total_amount(), method);
        let transaction_id = payment.transaction_id();
        self.payments.insert(payment).await?;
        metrics::counter!("payments_initiated_total", "method" => method.as_str()).increment(1);

        let initiation = match method {
            PaymentMethod::Gateway => {
                let url = self.config.redirect_url(order_id, order.total_amount())?;
                PaymentInitiation {
                    transaction_id,
                    status: PaymentStatus::Pending,
                    payment_url: Some(url),
                    message: "redirect the customer to complete payment".to_string(),
                }
            }
            PaymentMethod::CashOnDelivery | PaymentMethod::BankTransfer => {
                // Offline methods settle out of band; staff advance the
                // order separately, never this engine.
                PaymentInitiation {
                    transaction_id,
                    status: PaymentStatus::Pending,
                    payment_url: None,
                    message: format!("payment pending, due via {method}"),
                }
            }
        };

        tracing::info!(%order_id, %transaction_id, %method, "payment initiated");
        Ok(initiation)
    }

    /// Verifies a gateway callback for an order.
    ///
    /// Replays against a settled payment short-circuit to the recorded
    /// outcome without calling the gateway again. A gateway rejection
    /// settles the payment as `Failed` and is returned as an outcome;
    /// only transport faults surface as errors, leaving the payment
    /// pending for retry.
    #[tracing::instrument(skip(self))]
    pub async fn verify(
        &self,
        order_id: OrderId,
        gateway_ref: String,
        claimed_amount: Money,
    ) -> Result<PaymentOutcome> {
        let payment = self
            .payments
            .get_by_order(order_id)
            .await
            .ok_or_else(|| CommerceError::not_found("payment", order_id))?;

        if payment.status().is_terminal() {
            return Ok(Self::recorded_outcome(&payment));
        }

        if claimed_amount != payment.amount() {
            return Err(CommerceError::AmountMismatch {
                expected: payment.amount(),
                claimed: claimed_amount,
            });
        }

        // The stored amount is what the gateway is asked about; the
        // callback's claim never reaches the wire.
        let verdict = self
            .gateway
            .verify_transaction(VerificationRequest {
                amount: payment.amount(),
                merchant_code: self.config.merchant_code.clone(),
                gateway_ref: gateway_ref.clone(),
                order_ref: order_id,
            })
            .await?;

        let outcome = match verdict {
            GatewayVerdict::Verified => {
                let settled = self
                    .payments
                    .update(order_id, |p| {
                        if p.status() == PaymentStatus::Pending {
                            p.complete(gateway_ref.clone());
                        }
                        Ok(())
                    })
                    .await?;
                self.confirm_order(order_id).await;
                metrics::counter!("payments_completed_total").increment(1);
                tracing::info!(%order_id, "payment verified");
                Self::recorded_outcome(&settled)
            }
            GatewayVerdict::Rejected(reason) => {
                let settled = self
                    .payments
                    .update(order_id, |p| {
                        if p.status() == PaymentStatus::Pending {
                            p.fail(reason.clone());
                        }
                        Ok(())
                    })
                    .await?;
                metrics::counter!("payments_failed_total").increment(1);
                tracing::warn!(%order_id, %reason, "payment verification failed");
                Self::recorded_outcome(&settled)
            }
        };

        Ok(outcome)
    }

    /// Returns the payment for an order.
    pub async fn get(&self, order_id: OrderId) -> Result<Payment> {
        self.payments
            .get_by_order(order_id)
            .await
            .ok_or_else(|| CommerceError::not_found("payment", order_id))
    }

    fn describe_existing(&self, payment: &Payment) -> PaymentInitiation {
        let payment_url = match (payment.method(), payment.status()) {
            (PaymentMethod::Gateway, PaymentStatus::Pending) => self
                .config
                .redirect_url(payment.order_id(), payment.amount())
                .ok(),
            _ => None,
        };
        PaymentInitiation {
            transaction_id: payment.transaction_id(),
            status: payment.status(),
            payment_url,
            message: match payment.status() {
                PaymentStatus::Pending => "payment already initiated".to_string(),
                PaymentStatus::Completed => "payment already completed".to_string(),
                PaymentStatus::Failed => "payment previously failed".to_string(),
            },
        }
    }

    fn recorded_outcome(payment: &Payment) -> PaymentOutcome {
        PaymentOutcome {
            transaction_id: payment.transaction_id(),
            status: payment.status(),
            message: match payment.status() {
                PaymentStatus::Completed => "payment verified".to_string(),
                PaymentStatus::Failed => payment
                    .failure_reason()
                    .unwrap_or("payment failed")
                    .to_string(),
                PaymentStatus::Pending => "payment pending".to_string(),
            },
        }
    }

    /// Moves the order to `Confirmed` after settlement. An order that
    /// already left `Pending` is left alone.
    async fn confirm_order(&self, order_id: OrderId) {
        let result = self
            .orders
            .update(order_id, |order| {
                if order.status() == OrderStatus::Pending {
                    order.transition(OrderStatus::Confirmed)
                } else {
                    Ok(())
                }
            })
            .await;
        if let Err(err) = result {
            tracing::warn!(%order_id, error = %err, "could not confirm order after payment");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::UserId;
    use domain::{Address, Money, Order, OrderLine, TrackingNumber};
    use store::{InMemoryOrderStore, InMemoryPaymentStore};

    use crate::gateway::InMemoryGateway;

    struct Harness {
        engine: PaymentEngine<InMemoryPaymentStore, InMemoryOrderStore, InMemoryGateway>,
        payments: InMemoryPaymentStore,
        orders: InMemoryOrderStore,
        gateway: InMemoryGateway,
    }

    impl Harness {
        fn new() -> Self {
            let payments = InMemoryPaymentStore::new();
            let orders = InMemoryOrderStore::new();
            let gateway = InMemoryGateway::new();
            let engine = PaymentEngine::new(
                payments.clone(),
                orders.clone(),
                gateway.clone(),
                GatewayConfig::default(),
            );
            Self {
                engine,
                payments,
                orders,
                gateway,
            }
        }

        /// Inserts a pending order totalling $20.00.
        async fn pending_order(&self) -> OrderId {
            let order = Order::new(
                OrderId::new(),
                UserId::new(),
                "Asha",
                "asha@example.com",
                vec![OrderLine {
                    product_id: "SOCK-001".into(),
                    name: "Wool Socks".to_string(),
                    unit_price: Money::from_cents(1000),
                    quantity: 2,
                    color: None,
                    size: None,
                    thumbnail: None,
                }],
                Address {
                    street: "12 Market St".to_string(),
                    city: "Kathmandu".to_string(),
                    district: "Bagmati".to_string(),
                    postal_code: "44600".to_string(),
                    country: "NP".to_string(),
                },
                TrackingNumber::generate(),
            );
            let id = order.id();
            self.orders.insert(order).await.unwrap();
            id
        }
    }

    #[tokio::test]
    async fn gateway_initiation_returns_redirect_url() {
        let h = Harness::new();
        let order_id = h.pending_order().await;

        let initiation = h
            .engine
            .initiate(order_id, PaymentMethod::Gateway, Money::from_cents(2000))
            .await
            .unwrap();

        assert_eq!(initiation.status, PaymentStatus::Pending);
        let url = initiation.payment_url.unwrap();
        assert!(url.contains("amt=20.00"));
        assert!(url.contains(&format!("pid={order_id}")));
        assert_eq!(h.payments.count().await, 1);
    }

    #[tokio::test]
    async fn amount_mismatch_is_rejected_before_any_record() {
        let h = Harness::new();
        let order_id = h.pending_order().await;

        let result = h
            .engine
            .initiate(order_id, PaymentMethod::Gateway, Money::from_cents(100))
            .await;

        assert!(matches!(
            result,
            Err(CommerceError::AmountMismatch { expected, claimed })
                if expected.cents() == 2000 && claimed.cents() == 100
        ));
        assert_eq!(h.payments.count().await, 0);
    }

    #[tokio::test]
    async fn reinitiation_returns_the_existing_transaction() {
        let h = Harness::new();
        let order_id = h.pending_order().await;

        let first = h
            .engine
            .initiate(order_id, PaymentMethod::Gateway, Money::from_cents(2000))
            .await
            .unwrap();
        let second = h
            .engine
            .initiate(order_id, PaymentMethod::Gateway, Money::from_cents(2000))
            .await
            .unwrap();

        assert_eq!(first.transaction_id, second.transaction_id);
        assert!(second.payment_url.is_some());
        assert_eq!(h.payments.count().await, 1);
    }

    #[tokio::test]
    async fn cash_on_delivery_leaves_the_order_untouched() {
        let h = Harness::new();
        let order_id = h.pending_order().await;

        let initiation = h
            .engine
            .initiate(order_id, PaymentMethod::CashOnDelivery, Money::from_cents(2000))
            .await
            .unwrap();

        assert!(initiation.payment_url.is_none());
        assert_eq!(initiation.status, PaymentStatus::Pending);
        // Settlement and the order's progress are staff actions; initiation
        // records the pending payment and nothing else.
        let order = h.orders.get(order_id).await.unwrap();
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(
            h.payments.get_by_order(order_id).await.unwrap().status(),
            PaymentStatus::Pending
        );
    }

    #[tokio::test]
    async fn successful_verification_settles_payment_and_confirms_order() {
        let h = Harness::new();
        let order_id = h.pending_order().await;
        h.engine
            .initiate(order_id, PaymentMethod::Gateway, Money::from_cents(2000))
            .await
            .unwrap();

        let outcome = h
            .engine
            .verify(order_id, "GW-REF-42".to_string(), Money::from_cents(2000))
            .await
            .unwrap();

        assert_eq!(outcome.status, PaymentStatus::Completed);
        let payment = h.payments.get_by_order(order_id).await.unwrap();
        assert_eq!(payment.gateway_ref(), Some("GW-REF-42"));
        let order = h.orders.get(order_id).await.unwrap();
        assert_eq!(order.status(), OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn verification_replay_short_circuits_without_a_gateway_call() {
        let h = Harness::new();
        let order_id = h.pending_order().await;
        h.engine
            .initiate(order_id, PaymentMethod::Gateway, Money::from_cents(2000))
            .await
            .unwrap();

        h.engine
            .verify(order_id, "GW-REF-42".to_string(), Money::from_cents(2000))
            .await
            .unwrap();
        let replay = h
            .engine
            .verify(order_id, "GW-REF-OTHER".to_string(), Money::from_cents(2000))
            .await
            .unwrap();

        assert_eq!(replay.status, PaymentStatus::Completed);
        assert_eq!(h.gateway.call_count(), 1);
        // The original reference survives the replay.
        assert_eq!(
            h.payments.get_by_order(order_id).await.unwrap().gateway_ref(),
            Some("GW-REF-42")
        );
    }

    #[tokio::test]
    async fn rejected_verification_is_an_outcome_not_an_error() {
        let h = Harness::new();
        let order_id = h.pending_order().await;
        h.engine
            .initiate(order_id, PaymentMethod::Gateway, Money::from_cents(2000))
            .await
            .unwrap();
        h.gateway.set_reject("no matching transaction");

        let outcome = h
            .engine
            .verify(order_id, "GW-REF-42".to_string(), Money::from_cents(2000))
            .await
            .unwrap();

        assert_eq!(outcome.status, PaymentStatus::Failed);
        assert_eq!(outcome.message, "no matching transaction");
        let payment = h.payments.get_by_order(order_id).await.unwrap();
        assert_eq!(payment.status(), PaymentStatus::Failed);
        assert!(payment.gateway_ref().is_none());
        // The order never confirms on a failed payment.
        assert_eq!(
            h.orders.get(order_id).await.unwrap().status(),
            OrderStatus::Pending
        );
    }

    #[tokio::test]
    async fn transport_error_leaves_the_payment_pending_for_retry() {
        let h = Harness::new();
        let order_id = h.pending_order().await;
        h.engine
            .initiate(order_id, PaymentMethod::Gateway, Money::from_cents(2000))
            .await
            .unwrap();

        h.gateway.set_transport_error(true);
        let result = h
            .engine
            .verify(order_id, "GW-REF-42".to_string(), Money::from_cents(2000))
            .await;
        assert!(matches!(result, Err(CommerceError::Gateway(_))));
        assert_eq!(
            h.payments.get_by_order(order_id).await.unwrap().status(),
            PaymentStatus::Pending
        );

        // Once the gateway is reachable again the retry settles cleanly.
        h.gateway.set_transport_error(false);
        let outcome = h
            .engine
            .verify(order_id, "GW-REF-42".to_string(), Money::from_cents(2000))
            .await
            .unwrap();
        assert_eq!(outcome.status, PaymentStatus::Completed);
    }

    #[tokio::test]
    async fn verify_with_wrong_amount_is_rejected_without_settling() {
        let h = Harness::new();
        let order_id = h.pending_order().await;
        h.engine
            .initiate(order_id, PaymentMethod::Gateway, Money::from_cents(2000))
            .await
            .unwrap();

        let result = h
            .engine
            .verify(order_id, "GW-REF-42".to_string(), Money::from_cents(50))
            .await;

        assert!(matches!(result, Err(CommerceError::AmountMismatch { .. })));
        assert_eq!(h.gateway.call_count(), 0);
        assert_eq!(
            h.payments.get_by_order(order_id).await.unwrap().status(),
            PaymentStatus::Pending
        );
    }

    #[tokio::test]
    async fn unknown_order_and_payment_are_not_found() {
        let h = Harness::new();

        let initiate = h
            .engine
            .initiate(OrderId::new(), PaymentMethod::Gateway, Money::from_cents(1))
            .await;
        assert!(matches!(initiate, Err(CommerceError::NotFound { .. })));

        let verify = h
            .engine
            .verify(OrderId::new(), "GW-REF-1".to_string(), Money::from_cents(1))
            .await;
        assert!(matches!(verify, Err(CommerceError::NotFound { .. })));
    }
}
