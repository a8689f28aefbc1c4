//! Checkout orchestration layer for the storefront.
//!
//! This crate drives the three hard parts of the system:
//! - [`CheckoutOrchestrator`] converts a cart into an order as a single
//!   all-or-nothing unit, compensating partial reservations on failure
//! - [`OrderLifecycle`] enforces the order status state machine and the
//!   inventory-restoration side effect of cancellation
//! - [`PaymentEngine`] initiates payment attempts and reconciles
//!   asynchronous gateway callbacks via a trusted server-to-server
//!   verification call

pub mod cart;
pub mod customer;
pub mod gateway;
pub mod lifecycle;
pub mod orchestrator;
pub mod payment;

pub use cart::{CartService, PricedCart, PricedLine};
pub use customer::{CustomerDirectory, CustomerProfile, InMemoryCustomerDirectory};
pub use gateway::{
    GatewayConfig, GatewayVerdict, HttpGateway, InMemoryGateway, PaymentGateway,
    VerificationRequest,
};
pub use lifecycle::OrderLifecycle;
pub use orchestrator::CheckoutOrchestrator;
pub use payment::{PaymentEngine, PaymentInitiation, PaymentOutcome};
