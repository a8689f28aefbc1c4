//! Cart persistence.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::UserId;
use domain::{Cart, CartLine};
use tokio::sync::RwLock;

/// Persistence for per-user carts.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Returns the user's cart, creating an empty one on first access.
    async fn get_or_create(&self, user_id: UserId) -> Cart;

    /// Replaces the stored cart for its user.
    async fn put(&self, cart: Cart);

    /// Atomically removes and returns the cart's lines.
    ///
    /// Checkout drains the cart up front so a concurrent add cannot be
    /// silently cleared; failed checkouts restore the drained lines via
    /// [`CartStore::put`].
    async fn drain(&self, user_id: UserId) -> Vec<CartLine>;
}

/// In-memory cart store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCartStore {
    carts: Arc<RwLock<HashMap<UserId, Cart>>>,
}

impl InMemoryCartStore {
    /// Creates an empty cart store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn get_or_create(&self, user_id: UserId) -> Cart {
        let mut carts = self.carts.write().await;
        carts
            .entry(user_id)
            .or_insert_with(|| Cart::new(user_id))
            .clone()
    }

    async fn put(&self, cart: Cart) {
        self.carts.write().await.insert(cart.user_id(), cart);
    }

    async fn drain(&self, user_id: UserId) -> Vec<CartLine> {
        let mut carts = self.carts.write().await;
        match carts.get_mut(&user_id) {
            Some(cart) => {
                let lines = cart.lines().to_vec();
                cart.clear();
                lines
            }
            None => Vec::new(),
        }
    }
}
