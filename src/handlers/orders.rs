use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{ApiResponse, AuthUser};
use crate::domain::order::{AddressView, OrderView};
use crate::errors::AppError;
use crate::payment::CheckoutSession;
use crate::{AppCheckoutService, AppOrderService};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub address_id: Uuid,
    /// Totals as displayed by the client. Informational only; orders are
    /// priced from the stored cart.
    #[serde(default)]
    pub sub_total_amt: Option<f64>,
    #[serde(default)]
    pub total_amt: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductDetailsResponse {
    pub name: String,
    pub image: Vec<String>,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddressResponse {
    pub id: Uuid,
    pub address_line: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub country: String,
    pub mobile: String,
}

impl From<AddressView> for AddressResponse {
    fn from(a: AddressView) -> Self {
        Self {
            id: a.id,
            address_line: a.address_line,
            city: a.city,
            state: a.state,
            pincode: a.pincode,
            country: a.country,
            mobile: a.mobile,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_id: String,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub product_details: ProductDetailsResponse,
    pub payment_id: String,
    pub payment_status: String,
    pub delivery_address: Option<AddressResponse>,
    /// Decimal amount as a string, e.g. "1800.00".
    pub sub_total_amt: String,
    pub total_amt: String,
    pub created_at: DateTime<Utc>,
}

impl From<OrderView> for OrderResponse {
    fn from(o: OrderView) -> Self {
        Self {
            id: o.id,
            order_id: o.order_id,
            user_id: o.user_id,
            product_id: o.product_id,
            product_details: ProductDetailsResponse {
                name: o.product_details.name,
                image: o.product_details.image,
                quantity: o.product_details.quantity,
            },
            payment_id: o.payment_id,
            payment_status: o.payment_status,
            delivery_address: o.delivery_address.map(Into::into),
            sub_total_amt: o.sub_total.to_string(),
            total_amt: o.total.to_string(),
            created_at: o.created_at,
        }
    }
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

fn blocking_error(e: actix_web::error::BlockingError) -> AppError {
    AppError::Internal(e.to_string())
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /api/order/cash-on-delivery
///
/// Turns every cart line into an order payable on delivery and empties the
/// cart, in one transaction.
#[utoipa::path(
    post,
    path = "/api/order/cash-on-delivery",
    params(("X-User-Id" = Uuid, Header, description = "Authenticated user")),
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Orders placed", body = [OrderResponse]),
        (status = 400, description = "Cart is empty"),
        (status = 404, description = "Address not found"),
    ),
    tag = "orders"
)]
pub async fn cash_on_delivery(
    service: web::Data<AppCheckoutService>,
    user: AuthUser,
    body: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    log::debug!(
        "Cash-on-delivery checkout, client totals {:?}/{:?}",
        body.sub_total_amt,
        body.total_amt
    );
    let placed = web::block(move || service.cash_on_delivery(user.0, body.address_id))
        .await
        .map_err(blocking_error)??;
    let orders: Vec<OrderResponse> = placed.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Order successfully", orders)))
}

/// POST /api/order/checkout
///
/// Opens a hosted card-payment session for the cart. Orders are created by
/// the processor webhook once payment completes.
#[utoipa::path(
    post,
    path = "/api/order/checkout",
    params(("X-User-Id" = Uuid, Header, description = "Authenticated user")),
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Hosted session created", body = CheckoutSession),
        (status = 400, description = "Cart is empty"),
        (status = 404, description = "Address not found"),
        (status = 502, description = "Payment processor request failed"),
    ),
    tag = "orders"
)]
pub async fn card_checkout(
    service: web::Data<AppCheckoutService>,
    user: AuthUser,
    body: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
    let session = service
        .start_card_payment(user.0, body.into_inner().address_id)
        .await?;
    Ok(HttpResponse::Ok().json(session))
}

/// GET /api/order/order-list
///
/// The caller's orders, newest first, with delivery addresses.
#[utoipa::path(
    get,
    path = "/api/order/order-list",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
        ("X-User-Id" = Uuid, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 401, description = "Missing user"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    service: web::Data<AppOrderService>,
    user: AuthUser,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);

    let result = web::block(move || service.list_orders(user.0, page, limit))
        .await
        .map_err(blocking_error)??;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        "Order list",
        ListOrdersResponse {
            items: result.items.into_iter().map(Into::into).collect(),
            total: result.total,
            page,
            limit,
        },
    )))
}
