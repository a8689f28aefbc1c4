//! Product catalog and the inventory ledger.
//!
//! The ledger is conceptually its own component but physically shares the
//! catalog's record store: `available` lives on the product row and is
//! mutated only through [`InventoryLedger`] operations.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain::{CommerceError, Product, ProductId, Result};
use tokio::sync::RwLock;

/// Read-side product lookup.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Returns a product by ID, or `None` if absent.
    async fn get(&self, product_id: &ProductId) -> Option<Product>;
}

/// The authoritative, concurrency-safe store of per-product availability.
///
/// Both operations are atomic with respect to concurrent callers on the
/// same product: two reservations that would jointly exceed availability
/// must not both succeed.
#[async_trait]
pub trait InventoryLedger: Send + Sync {
    /// Atomically decrements availability by `quantity`.
    ///
    /// Fails with `InsufficientStock` when `available < quantity`, and
    /// with `NotFound` for an unknown product. Returns the new available
    /// count.
    async fn reserve(&self, product_id: &ProductId, quantity: u32) -> Result<u32>;

    /// Atomically increments availability by `quantity` (used on
    /// cancellation). Returns the new available count.
    async fn release(&self, product_id: &ProductId, quantity: u32) -> Result<u32>;
}

/// In-memory catalog backing both the read side and the ledger.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a product.
    pub async fn put(&self, product: Product) {
        self.products
            .write()
            .await
            .insert(product.id.clone(), product);
    }

    /// Returns the current availability of a product, for inspection in
    /// tests and admin views.
    pub async fn available(&self, product_id: &ProductId) -> Option<u32> {
        self.products
            .read()
            .await
            .get(product_id)
            .map(|p| p.available)
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn get(&self, product_id: &ProductId) -> Option<Product> {
        self.products.read().await.get(product_id).cloned()
    }
}

#[async_trait]
impl InventoryLedger for InMemoryCatalog {
    async fn reserve(&self, product_id: &ProductId, quantity: u32) -> Result<u32> {
        // Check and decrement under one write lock; this is the single
        // linearization point that rules out the lost-update hazard.
        let mut products = self.products.write().await;
        let product = products
            .get_mut(product_id)
            .ok_or_else(|| CommerceError::not_found("product", product_id))?;

        if product.available < quantity {
            return Err(CommerceError::InsufficientStock {
                product_id: product_id.clone(),
                requested: quantity,
                available: product.available,
            });
        }

        product.available -= quantity;
        metrics::counter!("inventory_reservations_total").increment(1);
        Ok(product.available)
    }

    async fn release(&self, product_id: &ProductId, quantity: u32) -> Result<u32> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(product_id)
            .ok_or_else(|| CommerceError::not_found("product", product_id))?;

        product.available += quantity;
        metrics::counter!("inventory_releases_total").increment(1);
        Ok(product.available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Money;

    fn product(id: &str, available: u32) -> Product {
        Product::new(id, "Wool Socks", Money::from_cents(899), available)
    }

    #[tokio::test]
    async fn reserve_decrements_and_returns_new_count() {
        let catalog = InMemoryCatalog::new();
        catalog.put(product("SOCK-001", 5)).await;

        let remaining = catalog.reserve(&"SOCK-001".into(), 2).await.unwrap();
        assert_eq!(remaining, 3);
        assert_eq!(catalog.available(&"SOCK-001".into()).await, Some(3));
    }

    #[tokio::test]
    async fn reserve_beyond_availability_fails_without_mutation() {
        let catalog = InMemoryCatalog::new();
        catalog.put(product("SOCK-001", 1)).await;

        let result = catalog.reserve(&"SOCK-001".into(), 2).await;
        assert!(matches!(
            result,
            Err(CommerceError::InsufficientStock {
                requested: 2,
                available: 1,
                ..
            })
        ));
        assert_eq!(catalog.available(&"SOCK-001".into()).await, Some(1));
    }

    #[tokio::test]
    async fn release_restores_availability() {
        let catalog = InMemoryCatalog::new();
        catalog.put(product("SOCK-001", 5)).await;

        catalog.reserve(&"SOCK-001".into(), 4).await.unwrap();
        let restored = catalog.release(&"SOCK-001".into(), 4).await.unwrap();
        assert_eq!(restored, 5);
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let catalog = InMemoryCatalog::new();
        let result = catalog.reserve(&"SOCK-404".into(), 1).await;
        assert!(matches!(result, Err(CommerceError::NotFound { .. })));
    }

    #[tokio::test]
    async fn concurrent_reserves_never_oversell() {
        let catalog = InMemoryCatalog::new();
        catalog.put(product("SOCK-001", 10)).await;

        let mut handles = Vec::new();
        for _ in 0..20 {
            let catalog = catalog.clone();
            handles.push(tokio::spawn(async move {
                catalog.reserve(&"SOCK-001".into(), 1).await.is_ok()
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 10);
        assert_eq!(catalog.available(&"SOCK-001".into()).await, Some(0));
    }
}
