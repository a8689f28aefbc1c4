//! Storage layer for the storefront.
//!
//! Defines the storage traits consumed by the checkout layer and provides
//! in-memory implementations. The in-memory stores guard shared state with
//! a single `RwLock` per store, which makes the inventory ledger's
//! compare-and-decrement a single linearization point per catalog.

pub mod cart;
pub mod catalog;
pub mod order;
pub mod payment;

pub use cart::{CartStore, InMemoryCartStore};
pub use catalog::{InMemoryCatalog, InventoryLedger, ProductCatalog};
pub use order::{InMemoryOrderStore, OrderStore};
pub use payment::{InMemoryPaymentStore, PaymentStore};
