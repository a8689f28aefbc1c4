//! Payment record, 1:1 with an order.

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;

/// Locally generated transaction identifier, unique per payment and used
/// for idempotent lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Creates a new random transaction ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a transaction ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Redirect-based external gateway; settled asynchronously via callback.
    Gateway,

    /// Paid on delivery; settled by staff action, not by the engine.
    CashOnDelivery,

    /// Manual bank transfer; settled by staff action.
    BankTransfer,
}

impl PaymentMethod {
    /// Returns the method name as a string.
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Gateway => "Gateway",
            PaymentMethod::CashOnDelivery => "CashOnDelivery",
            PaymentMethod::BankTransfer => "BankTransfer",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment lifecycle. `Completed` and `Failed` are both terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    /// Returns true if the status can no longer change.
    pub fn is_terminal(self) -> bool {
        matches!(self, PaymentStatus::Completed | PaymentStatus::Failed)
    }

    /// Returns the status name as a string.
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Completed => "Completed",
            PaymentStatus::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A payment attempt for an order.
///
/// Created once at initiation time with a fresh transaction ID. The
/// status field is append-only: it moves from `Pending` to exactly one
/// terminal state, and `gateway_ref` is populated only on verified
/// success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    order_id: OrderId,
    amount: Money,
    method: PaymentMethod,
    status: PaymentStatus,
    transaction_id: TransactionId,
    gateway_ref: Option<String>,
    failure_reason: Option<String>,
    created_at: DateTime<Utc>,
}

impl Payment {
    /// Creates a `Pending` payment with a freshly generated transaction ID.
    pub fn new(order_id: OrderId, amount: Money, method: PaymentMethod) -> Self {
        Self {
            order_id,
            amount,
            method,
            status: PaymentStatus::Pending,
            transaction_id: TransactionId::new(),
            gateway_ref: None,
            failure_reason: None,
            created_at: Utc::now(),
        }
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    pub fn gateway_ref(&self) -> Option<&str> {
        self.gateway_ref.as_deref()
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Marks the payment as verified, recording the gateway reference.
    ///
    /// Callers must short-circuit on terminal payments before invoking.
    pub fn complete(&mut self, gateway_ref: impl Into<String>) {
        debug_assert_eq!(self.status, PaymentStatus::Pending);
        self.status = PaymentStatus::Completed;
        self.gateway_ref = Some(gateway_ref.into());
    }

    /// Marks the payment as failed with a recorded reason.
    ///
    /// Callers must short-circuit on terminal payments before invoking.
    pub fn fail(&mut self, reason: impl Into<String>) {
        debug_assert_eq!(self.status, PaymentStatus::Pending);
        self.status = PaymentStatus::Failed;
        self.failure_reason = Some(reason.into());
    }
}
