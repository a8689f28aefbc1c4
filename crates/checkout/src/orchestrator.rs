//! Cart-to-order conversion as a single all-or-nothing unit.

use common::{OrderId, UserId};
use domain::{
    Address, CartLine, CommerceError, Order, OrderLine, ProductId, Result, TrackingNumber,
};
use store::{CartStore, InventoryLedger, OrderStore, ProductCatalog};

use crate::customer::CustomerDirectory;

/// How many tracking numbers to try before giving up on an insert.
const TRACKING_ATTEMPTS: usize = 3;

/// Converts a cart into an order atomically.
///
/// The orchestrator drains the cart, reserves inventory line by line, and
/// persists the order; any failure past the first reservation compensates
/// by releasing everything reserved in this attempt and restoring the
/// drained cart before the error is returned. No partial order ever
/// becomes visible.
pub struct CheckoutOrchestrator<CS, C, OS, D> {
    carts: CS,
    catalog: C,
    orders: OS,
    customers: D,
}

impl<CS, C, OS, D> CheckoutOrchestrator<CS, C, OS, D>
where
    CS: CartStore,
    C: ProductCatalog + InventoryLedger,
    OS: OrderStore,
    D: CustomerDirectory,
{
    /// Creates a new orchestrator over the given stores.
    pub fn new(carts: CS, catalog: C, orders: OS, customers: D) -> Self {
        Self {
            carts,
            catalog,
            orders,
            customers,
        }
    }

    /// Checks out the user's cart into a `Pending` order.
    ///
    /// Fails with `EmptyCart` when there is nothing to buy, and with
    /// `InsufficientStock` when any line exceeds current availability, in
    /// which case no inventory mutation survives.
    #[tracing::instrument(skip(self, shipping_address))]
    pub async fn checkout(&self, user_id: UserId, shipping_address: Address) -> Result<Order> {
        metrics::counter!("checkout_attempts_total").increment(1);
        let started = std::time::Instant::now();

        let profile = self
            .customers
            .get(user_id)
            .await
            .ok_or_else(|| CommerceError::not_found("user", user_id))?;

        // Drain up front so a concurrent add cannot slip between snapshot
        // and clear; failed attempts put the lines back.
        let lines = self.carts.drain(user_id).await;
        if lines.is_empty() {
            return Err(CommerceError::EmptyCart);
        }

        let mut reserved: Vec<(ProductId, u32)> = Vec::with_capacity(lines.len());
        let mut order_lines: Vec<OrderLine> = Vec::with_capacity(lines.len());

        for line in &lines {
            let product = match self.catalog.get(&line.product_id).await {
                Some(product) => product,
                None => {
                    let err = CommerceError::not_found("product", &line.product_id);
                    self.roll_back(user_id, &reserved, lines.clone()).await;
                    return Err(err);
                }
            };

            if let Err(err) = self.catalog.reserve(&line.product_id, line.quantity).await {
                self.roll_back(user_id, &reserved, lines.clone()).await;
                metrics::counter!("checkout_stock_conflicts_total").increment(1);
                return Err(err);
            }
            reserved.push((line.product_id.clone(), line.quantity));

            // Price lock-in: the charging price is re-read here, not taken
            // from the cart line.
            order_lines.push(OrderLine {
                product_id: line.product_id.clone(),
                name: product.name.clone(),
                unit_price: product.price,
                quantity: line.quantity,
                color: line.color.clone(),
                size: line.size.clone(),
                thumbnail: product.thumbnail().map(String::from),
            });
        }

        let mut order = Order::new(
            OrderId::new(),
            user_id,
            profile.name,
            profile.email,
            order_lines,
            shipping_address,
            TrackingNumber::generate(),
        );

        for _ in 0..TRACKING_ATTEMPTS {
            match self.orders.insert(order.clone()).await {
                Ok(()) => {
                    metrics::counter!("checkout_completed_total").increment(1);
                    metrics::histogram!("checkout_duration_seconds")
                        .record(started.elapsed().as_secs_f64());
                    tracing::info!(
                        order_id = %order.id(),
                        total = %order.total_amount(),
                        "checkout completed"
                    );
                    return Ok(order);
                }
                Err(CommerceError::TrackingCollision(tracking)) => {
                    tracing::warn!(%tracking, "tracking number collision, regenerating");
                    order.set_tracking_number(TrackingNumber::generate());
                }
                Err(err) => {
                    self.roll_back(user_id, &reserved, lines).await;
                    return Err(err);
                }
            }
        }

        self.roll_back(user_id, &reserved, lines).await;
        Err(CommerceError::Internal(
            "exhausted tracking number attempts".to_string(),
        ))
    }

    /// Releases every reservation made in this attempt and restores the
    /// drained cart lines.
    async fn roll_back(&self, user_id: UserId, reserved: &[(ProductId, u32)], lines: Vec<CartLine>) {
        for (product_id, quantity) in reserved {
            if let Err(err) = self.catalog.release(product_id, *quantity).await {
                tracing::error!(%product_id, error = %err, "failed to release reservation");
            }
        }

        let mut cart = self.carts.get_or_create(user_id).await;
        for line in lines {
            // Drained lines already passed quantity validation.
            let _ = cart.add_line(line.product_id, line.quantity, line.color, line.size);
        }
        self.carts.put(cart).await;
    }
}
