use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("processor returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("malformed processor response: {0}")]
    Decode(String),
}

impl From<PaymentError> for DomainError {
    fn from(e: PaymentError) -> Self {
        DomainError::Payment(e.to_string())
    }
}

/// One product line of a hosted checkout session.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItemRequest {
    pub product_id: Uuid,
    pub name: String,
    pub images: Vec<String>,
    /// Discounted unit price in minor units.
    pub unit_amount: i64,
    pub quantity: i32,
    /// Lower bound when the customer adjusts the quantity on the hosted page.
    pub adjustable_minimum: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSessionRequest {
    pub currency: String,
    pub customer_email: Option<String>,
    pub user_id: Uuid,
    pub address_id: Uuid,
    pub line_items: Vec<LineItemRequest>,
    pub success_url: String,
    pub cancel_url: String,
}

/// Reference returned to the browser so it can redirect to the hosted page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionLineItem {
    /// Processor-side product reference (`prod_...`).
    pub processor_product_id: String,
    pub quantity: i32,
    pub amount_total: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorProduct {
    pub id: String,
    pub name: String,
    pub images: Vec<String>,
    /// Our product id, carried in the product metadata.
    pub product_ref: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError>;

    async fn list_line_items(&self, session_id: &str) -> Result<Vec<SessionLineItem>, PaymentError>;

    async fn retrieve_product(&self, product_id: &str) -> Result<ProcessorProduct, PaymentError>;
}
