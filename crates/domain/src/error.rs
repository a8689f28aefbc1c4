//! The unified error taxonomy shared by every layer of the subsystem.

use thiserror::Error;

use crate::money::Money;
use crate::order::OrderStatus;
use crate::product::ProductId;

/// Errors that can occur across cart, checkout, order, and payment
/// operations.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// A referenced user, cart, line, order, product, or payment is absent.
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// A reservation would exceed the available quantity.
    #[error(
        "insufficient stock for {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// Checkout was attempted on an empty cart.
    #[error("cannot check out an empty cart")]
    EmptyCart,

    /// A cart mutation used a zero or overflowing quantity.
    #[error("invalid quantity")]
    InvalidQuantity,

    /// An illegal order status transition was attempted.
    #[error("invalid order status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Payment initiation amount disagrees with the order total.
    #[error("payment amount {claimed} does not match order total {expected}")]
    AmountMismatch { expected: Money, claimed: Money },

    /// The external gateway did not acknowledge the transaction.
    #[error("gateway verification failed: {0}")]
    GatewayVerificationFailed(String),

    /// The caller does not own the referenced resource.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Transport-level failure talking to the payment gateway.
    #[error("payment gateway error: {0}")]
    Gateway(String),

    /// A generated tracking number collided with a stored one.
    ///
    /// Never surfaced to clients; checkout regenerates and retries.
    #[error("tracking number already in use: {0}")]
    TrackingCollision(String),

    /// Unexpected internal fault, fatal to the request only.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CommerceError {
    /// Shorthand for a [`CommerceError::NotFound`] with a displayable id.
    pub fn not_found(resource: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }
}

/// Convenience type alias for storefront results.
pub type Result<T> = std::result::Result<T, CommerceError>;
