pub mod cart;
pub mod orders;
pub mod webhook;

use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use serde::{Deserialize, Serialize};
use utoipa::OpenApi;
use uuid::Uuid;

use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "X-User-Id";

/// Success envelope shared by every JSON endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: T,
    pub error: bool,
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data,
            error: false,
            success: true,
        }
    }
}

/// The authenticated customer. Session handling lives in front of this
/// service, which forwards the resolved user id in `X-User-Id`.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user = req
            .headers()
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .map(AuthUser)
            .ok_or(AppError::Unauthorized);
        ready(user)
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        cart::list_cart,
        cart::add_to_cart,
        cart::update_quantity,
        cart::adjust_quantity,
        cart::delete_cart_item,
        orders::cash_on_delivery,
        orders::card_checkout,
        orders::list_orders,
        webhook::stripe_webhook,
    ),
    components(schemas(
        cart::AddToCartRequest,
        cart::UpdateQuantityRequest,
        cart::AdjustQuantityRequest,
        cart::ProductResponse,
        cart::CartItemResponse,
        cart::QuantityChangeResponse,
        orders::CheckoutRequest,
        orders::ProductDetailsResponse,
        orders::AddressResponse,
        orders::OrderResponse,
        orders::ListOrdersResponse,
        crate::payment::CheckoutSession,
    )),
    tags(
        (name = "cart", description = "Shopping cart"),
        (name = "orders", description = "Checkout and order history"),
        (name = "webhooks", description = "Payment processor callbacks"),
    )
)]
pub struct ApiDoc;
