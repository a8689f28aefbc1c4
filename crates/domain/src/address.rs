//! Shipping address captured at checkout.

use serde::{Deserialize, Serialize};

/// A validated postal address, passed opaquely into checkout and frozen
/// on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub district: String,
    pub postal_code: String,
    pub country: String,
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}, {} {}, {}",
            self.street, self.city, self.district, self.postal_code, self.country
        )
    }
}
