use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{ApiResponse, AuthUser};
use crate::domain::cart::{CartLine, QuantityChange};
use crate::errors::AppError;
use crate::AppCartService;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuantityRequest {
    /// New absolute quantity; 0 removes the item.
    pub quantity: i32,
    /// When set, the update only applies if the stored quantity still
    /// equals this value (409 otherwise).
    #[serde(default)]
    pub expected_quantity: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdjustQuantityRequest {
    pub delta: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub images: Vec<String>,
    pub price: i64,
    pub discount: i32,
    pub final_price: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItemResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub quantity: i32,
    pub product: ProductResponse,
    pub created_at: DateTime<Utc>,
}

impl From<CartLine> for CartItemResponse {
    fn from(line: CartLine) -> Self {
        let final_price = line.product.final_price();
        Self {
            id: line.id,
            user_id: line.user_id,
            quantity: line.quantity,
            product: ProductResponse {
                id: line.product.id,
                name: line.product.name,
                images: line.product.images,
                price: line.product.price,
                discount: line.product.discount,
                final_price,
            },
            created_at: line.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QuantityChangeResponse {
    /// The updated item, absent when the change removed it.
    pub item: Option<CartItemResponse>,
    pub removed: bool,
}

impl From<QuantityChange> for QuantityChangeResponse {
    fn from(change: QuantityChange) -> Self {
        match change {
            QuantityChange::Updated(line) => Self {
                item: Some(line.into()),
                removed: false,
            },
            QuantityChange::Removed => Self {
                item: None,
                removed: true,
            },
        }
    }
}

fn blocking_error(e: actix_web::error::BlockingError) -> AppError {
    AppError::Internal(e.to_string())
}

// ── Handlers ─────────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/api/cart",
    params(("X-User-Id" = Uuid, Header, description = "Authenticated user")),
    responses(
        (status = 200, description = "Cart items, oldest first", body = [CartItemResponse]),
        (status = 401, description = "Missing user"),
    ),
    tag = "cart"
)]
pub async fn list_cart(
    service: web::Data<AppCartService>,
    user: AuthUser,
) -> Result<HttpResponse, AppError> {
    let lines = web::block(move || service.list_items(user.0))
        .await
        .map_err(blocking_error)??;
    let items: Vec<CartItemResponse> = lines.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Cart items", items)))
}

/// POST /api/cart
///
/// Adds a product with quantity 1. Adding a product already in the cart is a
/// conflict, not an increment.
#[utoipa::path(
    post,
    path = "/api/cart",
    params(("X-User-Id" = Uuid, Header, description = "Authenticated user")),
    request_body = AddToCartRequest,
    responses(
        (status = 201, description = "Item added", body = CartItemResponse),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Item already in cart"),
    ),
    tag = "cart"
)]
pub async fn add_to_cart(
    service: web::Data<AppCartService>,
    user: AuthUser,
    body: web::Json<AddToCartRequest>,
) -> Result<HttpResponse, AppError> {
    let product_id = body.into_inner().product_id;
    let line = web::block(move || service.add_item(user.0, product_id))
        .await
        .map_err(blocking_error)??;
    Ok(HttpResponse::Created().json(ApiResponse::ok(
        "Item added to cart",
        CartItemResponse::from(line),
    )))
}

#[utoipa::path(
    put,
    path = "/api/cart/{id}",
    params(
        ("id" = Uuid, Path, description = "Cart item id"),
        ("X-User-Id" = Uuid, Header, description = "Authenticated user"),
    ),
    request_body = UpdateQuantityRequest,
    responses(
        (status = 200, description = "Quantity updated or item removed", body = QuantityChangeResponse),
        (status = 400, description = "Negative quantity"),
        (status = 404, description = "Cart item not found"),
        (status = 409, description = "Stored quantity no longer matches expectedQuantity"),
    ),
    tag = "cart"
)]
pub async fn update_quantity(
    service: web::Data<AppCartService>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateQuantityRequest>,
) -> Result<HttpResponse, AppError> {
    let item_id = path.into_inner();
    let body = body.into_inner();
    let change = web::block(move || {
        service.update_quantity(user.0, item_id, body.quantity, body.expected_quantity)
    })
    .await
    .map_err(blocking_error)??;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        "Cart updated",
        QuantityChangeResponse::from(change),
    )))
}

/// POST /api/cart/{id}/adjust
///
/// Adds `delta` to the stored quantity atomically. A result of zero or less
/// removes the item.
#[utoipa::path(
    post,
    path = "/api/cart/{id}/adjust",
    params(
        ("id" = Uuid, Path, description = "Cart item id"),
        ("X-User-Id" = Uuid, Header, description = "Authenticated user"),
    ),
    request_body = AdjustQuantityRequest,
    responses(
        (status = 200, description = "Quantity adjusted or item removed", body = QuantityChangeResponse),
        (status = 400, description = "Zero delta"),
        (status = 404, description = "Cart item not found"),
    ),
    tag = "cart"
)]
pub async fn adjust_quantity(
    service: web::Data<AppCartService>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<AdjustQuantityRequest>,
) -> Result<HttpResponse, AppError> {
    let item_id = path.into_inner();
    let delta = body.into_inner().delta;
    let change = web::block(move || service.adjust_quantity(user.0, item_id, delta))
        .await
        .map_err(blocking_error)??;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        "Cart updated",
        QuantityChangeResponse::from(change),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/cart/{id}",
    params(
        ("id" = Uuid, Path, description = "Cart item id"),
        ("X-User-Id" = Uuid, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Item removed"),
        (status = 404, description = "Cart item not found"),
    ),
    tag = "cart"
)]
pub async fn delete_cart_item(
    service: web::Data<AppCartService>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let item_id = path.into_inner();
    web::block(move || service.remove_item(user.0, item_id))
        .await
        .map_err(blocking_error)??;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Item removed", ())))
}
