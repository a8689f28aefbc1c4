//! Payment persistence, keyed 1:1 by order.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use domain::{CommerceError, Payment, Result, TransactionId};
use tokio::sync::RwLock;

/// Persistence for payment records.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Persists a new payment. At most one payment may exist per order.
    async fn insert(&self, payment: Payment) -> Result<()>;

    /// Returns the payment for an order.
    async fn get_by_order(&self, order_id: OrderId) -> Option<Payment>;

    /// Returns the payment carrying a transaction ID.
    async fn get_by_transaction(&self, transaction_id: TransactionId) -> Option<Payment>;

    /// Atomically applies `f` to the stored payment and returns the
    /// updated copy.
    async fn update<F>(&self, order_id: OrderId, f: F) -> Result<Payment>
    where
        F: FnOnce(&mut Payment) -> Result<()> + Send;
}

/// In-memory payment store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    by_order: HashMap<OrderId, Payment>,
    by_transaction: HashMap<TransactionId, OrderId>,
}

impl InMemoryPaymentStore {
    /// Creates an empty payment store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored payments.
    pub async fn count(&self) -> usize {
        self.inner.read().await.by_order.len()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert(&self, payment: Payment) -> Result<()> {
        let mut inner = self.inner.write().await;
        let order_id = payment.order_id();

        if inner.by_order.contains_key(&order_id) {
            return Err(CommerceError::Internal(format!(
                "payment already exists for order {order_id}"
            )));
        }

        inner.by_transaction.insert(payment.transaction_id(), order_id);
        inner.by_order.insert(order_id, payment);
        Ok(())
    }

    async fn get_by_order(&self, order_id: OrderId) -> Option<Payment> {
        self.inner.read().await.by_order.get(&order_id).cloned()
    }

    async fn get_by_transaction(&self, transaction_id: TransactionId) -> Option<Payment> {
        let inner = self.inner.read().await;
        let order_id = inner.by_transaction.get(&transaction_id)?;
        inner.by_order.get(order_id).cloned()
    }

    async fn update<F>(&self, order_id: OrderId, f: F) -> Result<Payment>
    where
        F: FnOnce(&mut Payment) -> Result<()> + Send,
    {
        let mut inner = self.inner.write().await;
        let payment = inner
            .by_order
            .get_mut(&order_id)
            .ok_or_else(|| CommerceError::not_found("payment", order_id))?;
        f(payment)?;
        Ok(payment.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Money, PaymentMethod, PaymentStatus};

    #[tokio::test]
    async fn insert_and_lookup_by_order_and_transaction() {
        let store = InMemoryPaymentStore::new();
        let order_id = OrderId::new();
        let payment = Payment::new(order_id, Money::from_cents(2000), PaymentMethod::Gateway);
        let transaction_id = payment.transaction_id();

        store.insert(payment).await.unwrap();

        assert!(store.get_by_order(order_id).await.is_some());
        let by_txn = store.get_by_transaction(transaction_id).await.unwrap();
        assert_eq!(by_txn.order_id(), order_id);
    }

    #[tokio::test]
    async fn second_payment_for_same_order_is_rejected() {
        let store = InMemoryPaymentStore::new();
        let order_id = OrderId::new();

        store
            .insert(Payment::new(order_id, Money::from_cents(2000), PaymentMethod::Gateway))
            .await
            .unwrap();
        let result = store
            .insert(Payment::new(order_id, Money::from_cents(2000), PaymentMethod::Gateway))
            .await;

        assert!(matches!(result, Err(CommerceError::Internal(_))));
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn update_mutates_stored_payment() {
        let store = InMemoryPaymentStore::new();
        let order_id = OrderId::new();
        store
            .insert(Payment::new(order_id, Money::from_cents(2000), PaymentMethod::Gateway))
            .await
            .unwrap();

        let updated = store
            .update(order_id, |p| {
                p.complete("GW-REF-7");
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(updated.status(), PaymentStatus::Completed);
        assert_eq!(
            store.get_by_order(order_id).await.unwrap().gateway_ref(),
            Some("GW-REF-7")
        );
    }

    #[tokio::test]
    async fn missing_payment_is_not_found() {
        let store = InMemoryPaymentStore::new();
        let result = store.update(OrderId::new(), |_| Ok(())).await;
        assert!(matches!(result, Err(CommerceError::NotFound { .. })));
    }
}
