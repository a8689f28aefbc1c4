//! Mutable pre-purchase cart for a single user.

use common::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CommerceError, Result};
use crate::product::ProductId;

/// Unique identifier for a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(Uuid);

impl LineId {
    /// Creates a new random line ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a line ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for LineId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One desired item in a cart.
///
/// Lines are unique per `(product_id, color, size)`; adding the same
/// combination again merges quantities instead of duplicating the line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Line identifier, stable across quantity updates.
    pub id: LineId,

    /// The product this line refers to.
    pub product_id: ProductId,

    /// Desired quantity, always positive.
    pub quantity: u32,

    /// Selected color variant, if the product has one.
    pub color: Option<String>,

    /// Selected size variant, if the product has one.
    pub size: Option<String>,
}

impl CartLine {
    fn matches(&self, product_id: &ProductId, color: &Option<String>, size: &Option<String>) -> bool {
        &self.product_id == product_id && &self.color == color && &self.size == size
    }
}

/// A user's cart: an unordered collection of [`CartLine`]s.
///
/// The cart carries no monetary total of its own; totals are derived from
/// live catalog prices at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    user_id: UserId,
    lines: Vec<CartLine>,
}

impl Cart {
    /// Creates an empty cart for a user.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            lines: Vec::new(),
        }
    }

    /// Returns the owning user.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns all lines.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns a line by ID.
    pub fn line(&self, line_id: LineId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.id == line_id)
    }

    /// Adds quantity for a `(product, color, size)` combination.
    ///
    /// Merges into the existing line when the combination is already
    /// present, otherwise appends a new line. Returns the affected line ID.
    /// Fails with `InvalidQuantity` on a zero quantity or a merge that
    /// would overflow the line.
    pub fn add_line(
        &mut self,
        product_id: ProductId,
        quantity: u32,
        color: Option<String>,
        size: Option<String>,
    ) -> Result<LineId> {
        if quantity == 0 {
            return Err(CommerceError::InvalidQuantity);
        }

        if let Some(existing) = self
            .lines
            .iter_mut()
            .find(|l| l.matches(&product_id, &color, &size))
        {
            existing.quantity = existing
                .quantity
                .checked_add(quantity)
                .ok_or(CommerceError::InvalidQuantity)?;
            return Ok(existing.id);
        }

        let line = CartLine {
            id: LineId::new(),
            product_id,
            quantity,
            color,
            size,
        };
        let id = line.id;
        self.lines.push(line);
        Ok(id)
    }

    /// Sets the quantity of an existing line to a positive value.
    pub fn set_line_quantity(&mut self, line_id: LineId, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(CommerceError::InvalidQuantity);
        }
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.id == line_id)
            .ok_or_else(|| CommerceError::not_found("cart line", line_id))?;
        line.quantity = quantity;
        Ok(())
    }

    /// Removes a line, returning it.
    pub fn remove_line(&mut self, line_id: LineId) -> Result<CartLine> {
        let idx = self
            .lines
            .iter()
            .position(|l| l.id == line_id)
            .ok_or_else(|| CommerceError::not_found("cart line", line_id))?;
        Ok(self.lines.swap_remove(idx))
    }

    /// Removes all lines.
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}
