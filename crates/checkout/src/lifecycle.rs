//! Order status lifecycle with the cancellation side effect.

use common::{OrderId, UserId};
use domain::{CommerceError, Order, OrderStatus, Result};
use store::{InventoryLedger, OrderStore};

/// Drives orders through the status state machine.
///
/// Cancellation restores inventory exactly once: the transition into
/// `Cancelled` happens atomically inside the order store, so only the
/// caller that actually performed it runs the release.
pub struct OrderLifecycle<OS, L> {
    orders: OS,
    ledger: L,
}

impl<OS, L> OrderLifecycle<OS, L>
where
    OS: OrderStore,
    L: InventoryLedger,
{
    /// Creates a lifecycle service over the given stores.
    pub fn new(orders: OS, ledger: L) -> Self {
        Self { orders, ledger }
    }

    /// Returns an order by ID.
    pub async fn get(&self, order_id: OrderId) -> Result<Order> {
        self.orders
            .get(order_id)
            .await
            .ok_or_else(|| CommerceError::not_found("order", order_id))
    }

    /// Returns an order, verifying the caller owns it.
    pub async fn get_for_user(&self, user_id: UserId, order_id: OrderId) -> Result<Order> {
        let order = self.get(order_id).await?;
        if order.user_id() != user_id {
            return Err(CommerceError::Forbidden(format!(
                "order {order_id} does not belong to user {user_id}"
            )));
        }
        Ok(order)
    }

    /// Returns a user's orders, newest first.
    pub async fn for_user(&self, user_id: UserId) -> Vec<Order> {
        self.orders.for_user(user_id).await
    }

    /// Returns every order, newest first.
    pub async fn all(&self) -> Vec<Order> {
        self.orders.all().await
    }

    /// Moves an order to `next`, enforcing the transition table.
    ///
    /// Moving into `Cancelled` goes through [`OrderLifecycle::cancel`] so
    /// the inventory restoration runs.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(&self, order_id: OrderId, next: OrderStatus) -> Result<Order> {
        if next == OrderStatus::Cancelled {
            return self.cancel(order_id).await;
        }

        let order = self
            .orders
            .update(order_id, |order| order.transition(next))
            .await?;
        tracing::info!(%order_id, status = %order.status(), "order status updated");
        Ok(order)
    }

    /// Cancels an order and restores its inventory.
    ///
    /// Idempotent: cancelling an already-cancelled order is a no-op and
    /// never releases twice. Cancelling a shipped or delivered order
    /// fails with `InvalidTransition`.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, order_id: OrderId) -> Result<Order> {
        let mut transitioned = false;
        let order = self
            .orders
            .update(order_id, |order| {
                if order.status() == OrderStatus::Cancelled {
                    return Ok(());
                }
                order.transition(OrderStatus::Cancelled)?;
                transitioned = true;
                Ok(())
            })
            .await?;

        // Only the caller that performed the transition releases stock.
        if transitioned {
            for line in order.lines() {
                if let Err(err) = self.ledger.release(&line.product_id, line.quantity).await {
                    tracing::error!(
                        product_id = %line.product_id,
                        error = %err,
                        "failed to restore inventory on cancellation"
                    );
                }
            }
            metrics::counter!("orders_cancelled_total").increment(1);
            tracing::info!(%order_id, "order cancelled, inventory restored");
        }

        Ok(order)
    }

    /// Cancels an order on behalf of its owner.
    pub async fn cancel_for_user(&self, user_id: UserId, order_id: OrderId) -> Result<Order> {
        self.get_for_user(user_id, order_id).await?;
        self.cancel(order_id).await
    }
}
