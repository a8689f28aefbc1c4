//! Domain layer for the storefront checkout subsystem.
//!
//! This crate provides the core domain types:
//! - Cart and cart lines with composite-key merging
//! - Order with snapshotted lines and the status state machine
//! - Payment record with its own terminal status lifecycle
//! - The unified error taxonomy shared by all layers

pub mod address;
pub mod cart;
pub mod error;
pub mod money;
pub mod order;
pub mod payment;
pub mod product;

pub use address::Address;
pub use cart::{Cart, CartLine, LineId};
pub use error::{CommerceError, Result};
pub use money::Money;
pub use order::{Order, OrderLine, OrderStatus, TrackingNumber};
pub use payment::{Payment, PaymentMethod, PaymentStatus, TransactionId};
pub use product::{Product, ProductId};
