use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::errors::AppError;
use crate::payment::signature::SIGNATURE_HEADER;
use crate::AppOrderService;

/// POST /api/stripe/webhook
///
/// Receives processor events. The body is taken raw because the signature
/// covers the exact bytes sent.
#[utoipa::path(
    post,
    path = "/api/stripe/webhook",
    params(("Stripe-Signature" = String, Header, description = "t=<unix>,v1=<hex hmac>")),
    request_body(content = String, content_type = "application/json"),
    responses(
        (status = 200, description = "Event acknowledged"),
        (status = 400, description = "Invalid signature or malformed event"),
        (status = 502, description = "Payment processor request failed"),
    ),
    tag = "webhooks"
)]
pub async fn stripe_webhook(
    service: web::Data<AppOrderService>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let signature = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let outcome = service.handle_webhook(&body, signature).await?;
    log::debug!("Webhook processed: {:?}", outcome);

    Ok(HttpResponse::Ok().json(json!({ "received": true })))
}
