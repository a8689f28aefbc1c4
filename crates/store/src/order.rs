//! Order persistence with the tracking-number uniqueness constraint.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, UserId};
use domain::{CommerceError, Order, Result};
use tokio::sync::RwLock;

/// Persistence for orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order.
    ///
    /// Fails with `TrackingCollision` when the order's tracking number is
    /// already in use; the caller regenerates and retries.
    async fn insert(&self, order: Order) -> Result<()>;

    /// Returns an order by ID.
    async fn get(&self, order_id: OrderId) -> Option<Order>;

    /// Atomically applies `f` to the stored order and returns the updated
    /// copy.
    ///
    /// The closure runs under the store's write lock, so concurrent
    /// updates to the same order serialize; a status transition observed
    /// inside `f` cannot be raced by another caller.
    async fn update<F>(&self, order_id: OrderId, f: F) -> Result<Order>
    where
        F: FnOnce(&mut Order) -> Result<()> + Send;

    /// Returns all orders placed by a user, newest first.
    async fn for_user(&self, user_id: UserId) -> Vec<Order>;

    /// Returns every order, newest first (admin listing).
    async fn all(&self) -> Vec<Order>;
}

/// In-memory order store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    orders: HashMap<OrderId, Order>,
    tracking_numbers: HashSet<String>,
}

impl InMemoryOrderStore {
    /// Creates an empty order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn count(&self) -> usize {
        self.inner.read().await.orders.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: Order) -> Result<()> {
        let mut inner = self.inner.write().await;
        let tracking = order.tracking_number().as_str().to_string();

        if !inner.tracking_numbers.insert(tracking.clone()) {
            return Err(CommerceError::TrackingCollision(tracking));
        }

        inner.orders.insert(order.id(), order);
        Ok(())
    }

    async fn get(&self, order_id: OrderId) -> Option<Order> {
        self.inner.read().await.orders.get(&order_id).cloned()
    }

    async fn update<F>(&self, order_id: OrderId, f: F) -> Result<Order>
    where
        F: FnOnce(&mut Order) -> Result<()> + Send,
    {
        let mut inner = self.inner.write().await;
        let order = inner
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| CommerceError::not_found("order", order_id))?;
        f(order)?;
        Ok(order.clone())
    }

    async fn for_user(&self, user_id: UserId) -> Vec<Order> {
        let inner = self.inner.read().await;
        let mut orders: Vec<Order> = inner
            .orders
            .values()
            .filter(|o| o.user_id() == user_id)
            .cloned()
            .collect();
        orders.sort_by_key(|o| std::cmp::Reverse(o.created_at()));
        orders
    }

    async fn all(&self) -> Vec<Order> {
        let inner = self.inner.read().await;
        let mut orders: Vec<Order> = inner.orders.values().cloned().collect();
        orders.sort_by_key(|o| std::cmp::Reverse(o.created_at()));
        orders
    }
}
