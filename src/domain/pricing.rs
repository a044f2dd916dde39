//! Price arithmetic shared by checkout and order materialisation.
//!
//! Catalogue prices are whole currency units (`i64`). The payment processor
//! works in minor units, so amounts crossing that boundary go through
//! [`to_minor_units`] / [`from_minor_units`].

use bigdecimal::BigDecimal;

use super::errors::DomainError;

/// Minor units per whole currency unit (paise per rupee, cents per dollar).
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;

/// Amount taken off `price` for a percentage discount, rounded up.
pub fn discount_amount(price: i64, discount_percent: i32) -> i64 {
    let percent = i128::from(discount_percent.clamp(0, 100));
    let numerator = i128::from(price) * percent;
    // |ceil(price * percent / 100)| <= |price| for percent in 0..=100.
    (-((-numerator).div_euclid(100))) as i64
}

/// Unit price after discount: `price - ceil(price * discount / 100)`.
pub fn price_with_discount(price: i64, discount_percent: i32) -> i64 {
    price - discount_amount(price, discount_percent)
}

pub fn to_minor_units(amount: i64) -> Result<i64, DomainError> {
    amount.checked_mul(MINOR_UNITS_PER_MAJOR).ok_or_else(|| {
        DomainError::InvalidInput(format!("amount {amount} is too large to charge"))
    })
}

/// Exact conversion of a processor-reported minor-unit amount back to a
/// decimal amount with two fractional digits.
pub fn from_minor_units(minor: i64) -> BigDecimal {
    BigDecimal::new(minor.into(), 2)
}

/// Line total for `quantity` units at `unit_price`.
pub fn line_total(unit_price: i64, quantity: i32) -> Result<BigDecimal, DomainError> {
    unit_price
        .checked_mul(i64::from(quantity))
        .map(BigDecimal::from)
        .ok_or_else(|| {
            DomainError::InvalidInput(format!(
                "line total overflows ({unit_price} x {quantity})"
            ))
        })
}
