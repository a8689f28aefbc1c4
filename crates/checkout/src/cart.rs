//! Cart operations with live catalog pricing.
//!
//! Cart lines never cache a charging price; every read derives the total
//! from the catalog's current prices, and checkout re-reads them again at
//! lock-in time.

use common::UserId;
use domain::{CartLine, CommerceError, LineId, Money, ProductId, Result};
use serde::Serialize;
use store::{CartStore, ProductCatalog};

/// A cart line joined with live product data for display.
#[derive(Debug, Clone, Serialize)]
pub struct PricedLine {
    pub id: LineId,
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub line_total: Money,
    pub color: Option<String>,
    pub size: Option<String>,
    pub thumbnail: Option<String>,
}

/// A cart with totals derived from live prices at read time.
#[derive(Debug, Clone, Serialize)]
pub struct PricedCart {
    pub user_id: UserId,
    pub lines: Vec<PricedLine>,
    pub total: Money,
}

/// Cart component: owns the mutable pre-purchase line collection.
pub struct CartService<CS, C> {
    carts: CS,
    catalog: C,
}

impl<CS, C> CartService<CS, C>
where
    CS: CartStore,
    C: ProductCatalog,
{
    /// Creates a cart service over the given stores.
    pub fn new(carts: CS, catalog: C) -> Self {
        Self { carts, catalog }
    }

    /// Returns the user's cart, creating an empty one on first access.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, user_id: UserId) -> Result<PricedCart> {
        let cart = self.carts.get_or_create(user_id).await;
        self.price(user_id, cart.lines()).await
    }

    /// Adds quantity for a product variant, merging into an existing line
    /// when the `(product, color, size)` combination is already present.
    #[tracing::instrument(skip(self))]
    pub async fn add_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
        color: Option<String>,
        size: Option<String>,
    ) -> Result<PricedCart> {
        self.catalog
            .get(&product_id)
            .await
            .ok_or_else(|| CommerceError::not_found("product", &product_id))?;

        let mut cart = self.carts.get_or_create(user_id).await;
        cart.add_line(product_id, quantity, color, size)?;
        self.carts.put(cart.clone()).await;

        self.price(user_id, cart.lines()).await
    }

    /// Sets a line's quantity. Non-positive quantities remove the line;
    /// positive quantities are checked against current availability.
    #[tracing::instrument(skip(self))]
    pub async fn update_line_quantity(
        &self,
        user_id: UserId,
        line_id: LineId,
        quantity: i64,
    ) -> Result<PricedCart> {
        let mut cart = self.carts.get_or_create(user_id).await;

        if quantity <= 0 {
            cart.remove_line(line_id)?;
        } else {
            let quantity = u32::try_from(quantity)
                .map_err(|_| CommerceError::Internal("quantity out of range".to_string()))?;
            let line = cart
                .line(line_id)
                .ok_or_else(|| CommerceError::not_found("cart line", line_id))?;
            let product = self
                .catalog
                .get(&line.product_id)
                .await
                .ok_or_else(|| CommerceError::not_found("product", &line.product_id))?;

            if quantity > product.available {
                return Err(CommerceError::InsufficientStock {
                    product_id: product.id,
                    requested: quantity,
                    available: product.available,
                });
            }

            cart.set_line_quantity(line_id, quantity)?;
        }

        self.carts.put(cart.clone()).await;
        self.price(user_id, cart.lines()).await
    }

    /// Removes a line from the cart.
    #[tracing::instrument(skip(self))]
    pub async fn remove_line(&self, user_id: UserId, line_id: LineId) -> Result<PricedCart> {
        let mut cart = self.carts.get_or_create(user_id).await;
        cart.remove_line(line_id)?;
        self.carts.put(cart.clone()).await;
        self.price(user_id, cart.lines()).await
    }

    /// Removes every line from the cart.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, user_id: UserId) -> Result<PricedCart> {
        let mut cart = self.carts.get_or_create(user_id).await;
        cart.clear();
        self.carts.put(cart).await;
        self.price(user_id, &[]).await
    }

    async fn price(&self, user_id: UserId, lines: &[CartLine]) -> Result<PricedCart> {
        let mut priced = Vec::with_capacity(lines.len());
        let mut total = Money::zero();

        for line in lines {
            let product = self
                .catalog
                .get(&line.product_id)
                .await
                .ok_or_else(|| CommerceError::not_found("product", &line.product_id))?;
            let line_total = product.price * line.quantity;
            total += line_total;
            priced.push(PricedLine {
                id: line.id,
                product_id: line.product_id.clone(),
                name: product.name,
                unit_price: product.price,
                quantity: line.quantity,
                line_total,
                color: line.color.clone(),
                size: line.size.clone(),
                thumbnail: product.images.into_iter().next(),
            });
        }

        Ok(PricedCart {
            user_id,
            lines: priced,
            total,
        })
    }
}
