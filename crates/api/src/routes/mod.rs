//! Route handlers and shared application state.

pub mod cart;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod payments;

use checkout::{
    CartService, CheckoutOrchestrator, InMemoryCustomerDirectory, OrderLifecycle, PaymentEngine,
    PaymentGateway,
};
use common::{OrderId, UserId};
use domain::LineId;
use store::{InMemoryCartStore, InMemoryCatalog, InMemoryOrderStore, InMemoryPaymentStore};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
///
/// Generic over the payment gateway so tests can swap in the in-memory
/// client while the binary talks to the real one.
pub struct AppState<G: PaymentGateway> {
    pub carts: CartService<InMemoryCartStore, InMemoryCatalog>,
    pub checkout: CheckoutOrchestrator<
        InMemoryCartStore,
        InMemoryCatalog,
        InMemoryOrderStore,
        InMemoryCustomerDirectory,
    >,
    pub lifecycle: OrderLifecycle<InMemoryOrderStore, InMemoryCatalog>,
    pub payments: PaymentEngine<InMemoryPaymentStore, InMemoryOrderStore, G>,
    pub catalog: InMemoryCatalog,
    pub customers: InMemoryCustomerDirectory,
}

fn parse_user_id(id: &str) -> Result<UserId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid user ID: {e}")))?;
    Ok(UserId::from_uuid(uuid))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order ID: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}

fn parse_line_id(id: &str) -> Result<LineId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid line ID: {e}")))?;
    Ok(LineId::from_uuid(uuid))
}
