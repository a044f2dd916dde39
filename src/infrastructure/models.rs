use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::cart::ProductSummary;
use crate::domain::order::AddressView;
use crate::schema::{addresses, cart_items, checkout_sessions, orders, products, users};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub images: Vec<String>,
    pub price: i64,
    pub discount: i32,
    pub created_at: DateTime<Utc>,
}

impl From<ProductRow> for ProductSummary {
    fn from(row: ProductRow) -> Self {
        ProductSummary {
            id: row.id,
            name: row.name,
            images: row.images,
            price: row.price,
            discount: row.discount,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = products)]
pub struct NewProductRow {
    pub id: Uuid,
    pub name: String,
    pub images: Vec<String>,
    pub price: i64,
    pub discount: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = addresses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AddressRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub address_line: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub country: String,
    pub mobile: String,
    pub created_at: DateTime<Utc>,
}

impl From<AddressRow> for AddressView {
    fn from(row: AddressRow) -> Self {
        AddressView {
            id: row.id,
            address_line: row.address_line,
            city: row.city,
            state: row.state,
            pincode: row.pincode,
            country: row.country,
            mobile: row.mobile,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = addresses)]
pub struct NewAddressRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub address_line: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub country: String,
    pub mobile: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = cart_items)]
#[diesel(belongs_to(ProductRow, foreign_key = product_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartItemRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = cart_items)]
pub struct NewCartItemRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = checkout_sessions)]
#[diesel(primary_key(session_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CheckoutSessionRow {
    pub session_id: String,
    pub user_id: Uuid,
    pub address_id: Option<Uuid>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = checkout_sessions)]
pub struct NewCheckoutSessionRow {
    pub session_id: String,
    pub user_id: Uuid,
    pub address_id: Option<Uuid>,
    pub status: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub order_id: String,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub product_details: Value,
    pub payment_id: String,
    pub payment_status: String,
    pub delivery_address_id: Option<Uuid>,
    pub checkout_session_id: Option<String>,
    pub sub_total: BigDecimal,
    pub total: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub order_id: String,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub product_details: Value,
    pub payment_id: String,
    pub payment_status: String,
    pub delivery_address_id: Option<Uuid>,
    pub checkout_session_id: Option<String>,
    pub sub_total: BigDecimal,
    pub total: BigDecimal,
}
