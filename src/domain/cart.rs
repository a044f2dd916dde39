use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::pricing::price_with_discount;

#[derive(Debug, Clone, PartialEq)]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub images: Vec<String>,
    pub price: i64,
    pub discount: i32,
}

impl ProductSummary {
    pub fn final_price(&self) -> i64 {
        price_with_discount(self.price, self.discount)
    }
}

/// A cart item joined with the product it references.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product: ProductSummary,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

/// Result of a quantity write: either the item survives with its new
/// quantity, or it reached zero and was deleted.
#[derive(Debug, Clone, PartialEq)]
pub enum QuantityChange {
    Updated(CartLine),
    Removed,
}

/// Quantity after applying `delta`, or `None` when the item must be removed.
pub fn apply_delta(current: i32, delta: i32) -> Result<Option<i32>, DomainError> {
    let next = current
        .checked_add(delta)
        .ok_or_else(|| DomainError::InvalidInput(format!("quantity overflow ({current} + {delta})")))?;
    Ok(target_quantity(next))
}

/// Absolute quantity to persist, or `None` when the item must be removed.
pub fn target_quantity(quantity: i32) -> Option<i32> {
    (quantity > 0).then_some(quantity)
}
