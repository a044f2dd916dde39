use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::cart::CartLine;
use super::errors::DomainError;
use super::pricing::{from_minor_units, line_total};

pub const ORDER_ID_PREFIX: &str = "ORD-";
pub const CASH_ON_DELIVERY_STATUS: &str = "CASH ON DELIVERY";

/// Product details frozen at order time. Orders render this snapshot, never
/// the live product row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub name: String,
    pub image: Vec<String>,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct NewOrderInput {
    pub order_id: String,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub product_details: ProductSnapshot,
    pub payment_id: String,
    pub payment_status: String,
    pub delivery_address_id: Option<Uuid>,
    pub checkout_session_id: Option<String>,
    pub sub_total: BigDecimal,
    pub total: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddressView {
    pub id: Uuid,
    pub address_line: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub country: String,
    pub mobile: String,
}

#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: Uuid,
    pub order_id: String,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub product_details: ProductSnapshot,
    pub payment_id: String,
    pub payment_status: String,
    pub delivery_address: Option<AddressView>,
    pub sub_total: BigDecimal,
    pub total: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<OrderView>,
    pub total: i64,
}

/// Public order number, e.g. `ORD-3f2b...`.
pub fn generate_order_id() -> String {
    format!("{}{}", ORDER_ID_PREFIX, Uuid::new_v4().simple())
}

/// Order for one cart line paid on delivery: full catalogue price, no discount.
pub fn cash_on_delivery_order(
    user_id: Uuid,
    address_id: Uuid,
    line: &CartLine,
) -> Result<NewOrderInput, DomainError> {
    let amount = line_total(line.product.price, line.quantity)?;
    Ok(NewOrderInput {
        order_id: generate_order_id(),
        user_id,
        product_id: line.product.id,
        product_details: ProductSnapshot {
            name: line.product.name.clone(),
            image: line.product.images.clone(),
            quantity: line.quantity,
        },
        payment_id: String::new(),
        payment_status: CASH_ON_DELIVERY_STATUS.to_string(),
        delivery_address_id: Some(address_id),
        checkout_session_id: None,
        sub_total: amount.clone(),
        total: amount,
    })
}

/// A line item of a completed hosted-checkout session, as reported by the
/// payment processor.
#[derive(Debug, Clone)]
pub struct PaidLine {
    pub product_id: Uuid,
    pub name: String,
    pub images: Vec<String>,
    pub quantity: i32,
    pub amount_total_minor: i64,
}

#[derive(Debug, Clone)]
pub struct PaymentDetails {
    pub session_id: String,
    pub user_id: Uuid,
    pub address_id: Option<Uuid>,
    pub payment_id: String,
    pub payment_status: String,
}

pub fn paid_order(payment: &PaymentDetails, line: &PaidLine) -> NewOrderInput {
    let amount = from_minor_units(line.amount_total_minor);
    NewOrderInput {
        order_id: generate_order_id(),
        user_id: payment.user_id,
        product_id: line.product_id,
        product_details: ProductSnapshot {
            name: line.name.clone(),
            image: line.images.clone(),
            quantity: line.quantity,
        },
        payment_id: payment.payment_id.clone(),
        payment_status: payment.payment_status.clone(),
        delivery_address_id: payment.address_id,
        checkout_session_id: Some(payment.session_id.clone()),
        sub_total: amount.clone(),
        total: amount,
    }
}
