//! Immutable order record and its status state machine.

use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::address::Address;
use crate::error::{CommerceError, Result};
use crate::money::Money;
use crate::product::ProductId;

/// The status of an order in its lifecycle.
///
/// Transitions:
/// ```text
/// Pending ──► Confirmed ──► Shipped ──► Delivered
///    │            │
///    └────────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Created by checkout, awaiting payment confirmation.
    #[default]
    Pending,

    /// Payment confirmed, order is being prepared.
    Confirmed,

    /// Handed to the carrier.
    Shipped,

    /// Received by the customer (terminal).
    Delivered,

    /// Cancelled, inventory restored (terminal).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if `next` is a legal transition from this status.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Shipped)
                | (Confirmed, Cancelled)
                | (Shipped, Delivered)
        )
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns the status name as a string.
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A human-presentable, externally shareable order reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingNumber(String);

impl TrackingNumber {
    /// Fixed prefix for all tracking numbers.
    pub const PREFIX: &'static str = "TRK-";

    /// Generates a tracking number with a random 10-character uppercase
    /// alphanumeric suffix.
    ///
    /// Collision probability is negligible, but uniqueness is enforced by
    /// the order store on insert, not by generation alone.
    pub fn generate() -> Self {
        let hex = Uuid::new_v4().simple().to_string();
        Self(format!("{}{}", Self::PREFIX, hex[..10].to_uppercase()))
    }

    /// Returns the tracking number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TrackingNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A line frozen onto an order at the moment of purchase.
///
/// Name, price, and thumbnail are snapshots; later product mutation does
/// not affect them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub color: Option<String>,
    pub size: Option<String>,
    pub thumbnail: Option<String>,
}

impl OrderLine {
    /// Returns `unit_price × quantity`.
    pub fn total_price(&self) -> Money {
        self.unit_price * self.quantity
    }
}

/// An order created by a successful checkout.
///
/// Immutable after creation except for `status` and `tracking_number`.
/// The total is computed once from the snapshotted lines and never
/// recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    customer_name: String,
    customer_email: String,
    status: OrderStatus,
    lines: Vec<OrderLine>,
    total_amount: Money,
    shipping_address: Address,
    tracking_number: TrackingNumber,
    created_at: DateTime<Utc>,
}

impl Order {
    /// Creates a `Pending` order from snapshotted lines.
    pub fn new(
        id: OrderId,
        user_id: UserId,
        customer_name: impl Into<String>,
        customer_email: impl Into<String>,
        lines: Vec<OrderLine>,
        shipping_address: Address,
        tracking_number: TrackingNumber,
    ) -> Self {
        let total_amount = lines.iter().map(OrderLine::total_price).sum();
        Self {
            id,
            user_id,
            customer_name: customer_name.into(),
            customer_email: customer_email.into(),
            status: OrderStatus::Pending,
            lines,
            total_amount,
            shipping_address,
            tracking_number,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn customer_email(&self) -> &str {
        &self.customer_email
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn shipping_address(&self) -> &Address {
        &self.shipping_address
    }

    pub fn tracking_number(&self) -> &TrackingNumber {
        &self.tracking_number
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Moves the order to `next`, failing with `InvalidTransition` when
    /// the state machine forbids it.
    pub fn transition(&mut self, next: OrderStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(CommerceError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Replaces the tracking number (e.g. when a carrier label is issued).
    pub fn set_tracking_number(&mut self, tracking_number: TrackingNumber) {
        self.tracking_number = tracking_number;
    }
}
