use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::run_blocking;
use crate::domain::checkout::{MaterializeOutcome, SessionStatus};
use crate::domain::errors::DomainError;
use crate::domain::order::{paid_order, ListResult, PaidLine, PaymentDetails};
use crate::domain::ports::OrderRepository;
use crate::payment::events::{
    CheckoutSessionObject, WebhookEvent, CHECKOUT_SESSION_COMPLETED, CHECKOUT_SESSION_EXPIRED,
};
use crate::payment::{signature, PaymentGateway};

#[derive(Debug, Clone)]
pub struct WebhookSettings {
    pub secret: String,
    pub tolerance_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Materialized { orders: usize, cart_cleared: bool },
    /// The session had already been confirmed by an earlier delivery.
    Duplicate,
    Expired { abandoned: bool },
    Ignored { event_type: String },
}

/// Materialises orders from processor confirmations and serves the order
/// history.
pub struct OrderService<O> {
    orders: Arc<O>,
    gateway: Arc<dyn PaymentGateway>,
    webhook: WebhookSettings,
}

fn parse_session(object: serde_json::Value) -> Result<CheckoutSessionObject, DomainError> {
    serde_json::from_value(object)
        .map_err(|e| DomainError::InvalidInput(format!("malformed checkout session: {e}")))
}

fn parse_uuid(value: Option<&str>, field: &str) -> Result<Uuid, DomainError> {
    value
        .and_then(|v| Uuid::parse_str(v).ok())
        .ok_or_else(|| DomainError::InvalidInput(format!("session metadata {field} is missing or invalid")))
}

impl<O: OrderRepository> OrderService<O> {
    pub fn new(orders: Arc<O>, gateway: Arc<dyn PaymentGateway>, webhook: WebhookSettings) -> Self {
        Self {
            orders,
            gateway,
            webhook,
        }
    }

    pub fn list_orders(&self, user_id: Uuid, page: i64, limit: i64) -> Result<ListResult, DomainError> {
        self.orders.list(user_id, page, limit)
    }

    /// Verifies and dispatches one processor delivery. `payload` must be the
    /// raw request body the signature was computed over.
    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
    ) -> Result<WebhookOutcome, DomainError> {
        signature::verify(
            payload,
            signature_header,
            &self.webhook.secret,
            self.webhook.tolerance_secs,
            Utc::now().timestamp(),
        )
        .map_err(|e| DomainError::InvalidSignature(e.to_string()))?;

        let event: WebhookEvent = serde_json::from_slice(payload)
            .map_err(|e| DomainError::InvalidInput(format!("malformed event: {e}")))?;

        match event.event_type.as_str() {
            CHECKOUT_SESSION_COMPLETED => {
                let session = parse_session(event.data.object)?;
                self.complete_session(session).await
            }
            CHECKOUT_SESSION_EXPIRED => {
                let session = parse_session(event.data.object)?;
                let orders = Arc::clone(&self.orders);
                let abandoned = run_blocking(move || orders.abandon_session(&session.id)).await?;
                Ok(WebhookOutcome::Expired { abandoned })
            }
            other => {
                log::info!("Unhandled event type {} ({})", other, event.id);
                Ok(WebhookOutcome::Ignored {
                    event_type: other.to_string(),
                })
            }
        }
    }

    async fn complete_session(
        &self,
        session: CheckoutSessionObject,
    ) -> Result<WebhookOutcome, DomainError> {
        let user_id = parse_uuid(session.metadata.user_id.as_deref(), "userId")?;
        let address_id = match session.metadata.address_id.as_deref() {
            Some(raw) => Some(parse_uuid(Some(raw), "addressId")?),
            None => None,
        };

        let orders = Arc::clone(&self.orders);
        let session_id = session.id.clone();
        let status = run_blocking(move || orders.session_status(&session_id)).await?;
        if status == Some(SessionStatus::Confirmed) {
            log::warn!("Checkout session {} already confirmed, skipping", session.id);
            return Ok(WebhookOutcome::Duplicate);
        }

        let items = self.gateway.list_line_items(&session.id).await?;
        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let product = self
                .gateway
                .retrieve_product(&item.processor_product_id)
                .await?;
            let product_id = product
                .product_ref
                .as_deref()
                .and_then(|r| Uuid::parse_str(r).ok())
                .ok_or_else(|| {
                    DomainError::InvalidInput(format!(
                        "processor product {} carries no productId",
                        product.id
                    ))
                })?;
            lines.push(PaidLine {
                product_id,
                name: product.name,
                images: product.images,
                quantity: item.quantity,
                amount_total_minor: item.amount_total,
            });
        }

        let payment = PaymentDetails {
            session_id: session.id,
            user_id,
            address_id,
            payment_id: session.payment_intent.unwrap_or_default(),
            payment_status: session.payment_status,
        };
        let inputs = lines.iter().map(|line| paid_order(&payment, line)).collect();

        let orders = Arc::clone(&self.orders);
        let session_id = payment.session_id.clone();
        let outcome = run_blocking(move || orders.materialize_paid_orders(&payment, inputs)).await?;

        match outcome {
            MaterializeOutcome::Duplicate => {
                log::warn!("Checkout session {} confirmed concurrently, skipping", session_id);
                Ok(WebhookOutcome::Duplicate)
            }
            MaterializeOutcome::Materialized {
                orders,
                cart_cleared,
            } => {
                log::info!(
                    "Materialized {} order(s) for session {} (cart cleared: {})",
                    orders,
                    session_id,
                    cart_cleared
                );
                Ok(WebhookOutcome::Materialized {
                    orders,
                    cart_cleared,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::application::fakes::{FakeGateway, InMemoryCartRepository, InMemoryOrderRepository};
    use crate::domain::ports::CartRepository;
    use crate::payment::signature::signature_header;

    const SECRET: &str = "whsec_test";

    struct Fixture {
        carts: Arc<InMemoryCartRepository>,
        orders: Arc<InMemoryOrderRepository>,
        service: OrderService<InMemoryOrderRepository>,
    }

    fn fixture(gateway: FakeGateway) -> Fixture {
        let carts = Arc::new(InMemoryCartRepository::default());
        let orders = Arc::new(InMemoryOrderRepository::new(Arc::clone(&carts)));
        let service = OrderService::new(
            Arc::clone(&orders),
            Arc::new(gateway),
            WebhookSettings {
                secret: SECRET.to_string(),
                tolerance_secs: 300,
            },
        );
        Fixture {
            carts,
            orders,
            service,
        }
    }

    fn event(event_type: &str, session_id: &str, user_id: Uuid) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "id": "evt_test",
            "type": event_type,
            "data": { "object": {
                "id": session_id,
                "payment_intent": "pi_test",
                "payment_status": "paid",
                "metadata": { "userId": user_id.to_string() }
            }}
        }))
        .expect("serialize event")
    }

    fn signed(payload: &[u8]) -> String {
        signature_header(payload, SECRET, Utc::now().timestamp()).expect("sign")
    }

    #[tokio::test]
    async fn completed_session_creates_one_order_per_line_item() {
        let gateway = FakeGateway::default();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        gateway.with_line("cs_1", first, 2, 180_000);
        gateway.with_line("cs_1", second, 1, 4_550);
        let f = fixture(gateway);
        let user_id = Uuid::new_v4();
        let product = f.carts.with_product("Tea", 100, 0);
        f.carts.add(user_id, product).expect("add failed");

        let payload = event(CHECKOUT_SESSION_COMPLETED, "cs_1", user_id);
        let outcome = f
            .service
            .handle_webhook(&payload, Some(&signed(&payload)))
            .await
            .expect("webhook failed");

        assert_eq!(
            outcome,
            WebhookOutcome::Materialized {
                orders: 2,
                cart_cleared: true
            }
        );
        let orders = f.orders.orders.lock().unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].product_id, first);
        assert_eq!(orders[0].total.to_string(), "1800.00");
        assert_eq!(orders[0].payment_id, "pi_test");
        assert_eq!(orders[1].total.to_string(), "45.50");
        assert!(f.carts.list(user_id).expect("list failed").is_empty());
    }

    #[tokio::test]
    async fn duplicate_delivery_creates_no_extra_orders() {
        let gateway = FakeGateway::default();
        gateway.with_line("cs_dup", Uuid::new_v4(), 1, 10_000);
        let f = fixture(gateway);
        let user_id = Uuid::new_v4();
        let payload = event(CHECKOUT_SESSION_COMPLETED, "cs_dup", user_id);

        f.service
            .handle_webhook(&payload, Some(&signed(&payload)))
            .await
            .expect("first delivery failed");
        let second = f
            .service
            .handle_webhook(&payload, Some(&signed(&payload)))
            .await
            .expect("second delivery failed");

        assert_eq!(second, WebhookOutcome::Duplicate);
        assert_eq!(f.orders.order_count(), 1);
    }

    #[tokio::test]
    async fn session_without_line_items_keeps_cart() {
        let f = fixture(FakeGateway::default());
        let user_id = Uuid::new_v4();
        let product = f.carts.with_product("Tea", 100, 0);
        f.carts.add(user_id, product).expect("add failed");
        let payload = event(CHECKOUT_SESSION_COMPLETED, "cs_none", user_id);

        let outcome = f
            .service
            .handle_webhook(&payload, Some(&signed(&payload)))
            .await
            .expect("webhook failed");

        assert_eq!(
            outcome,
            WebhookOutcome::Materialized {
                orders: 0,
                cart_cleared: false
            }
        );
        assert_eq!(f.carts.list(user_id).expect("list failed").len(), 1);
    }

    #[tokio::test]
    async fn unrecognized_event_is_acknowledged_without_orders() {
        let f = fixture(FakeGateway::default());
        let payload = event("payment_intent.created", "cs_x", Uuid::new_v4());

        let outcome = f
            .service
            .handle_webhook(&payload, Some(&signed(&payload)))
            .await
            .expect("webhook failed");

        assert_eq!(
            outcome,
            WebhookOutcome::Ignored {
                event_type: "payment_intent.created".to_string()
            }
        );
        assert_eq!(f.orders.order_count(), 0);
    }

    #[tokio::test]
    async fn forged_event_is_rejected_before_processing() {
        let gateway = FakeGateway::default();
        gateway.with_line("cs_forged", Uuid::new_v4(), 1, 10_000);
        let f = fixture(gateway);
        let payload = event(CHECKOUT_SESSION_COMPLETED, "cs_forged", Uuid::new_v4());

        let unsigned = f.service.handle_webhook(&payload, None).await;
        let wrong_key = signature_header(&payload, "whsec_attacker", Utc::now().timestamp())
            .expect("sign");
        let forged = f.service.handle_webhook(&payload, Some(&wrong_key)).await;

        assert!(matches!(unsigned, Err(DomainError::InvalidSignature(_))));
        assert!(matches!(forged, Err(DomainError::InvalidSignature(_))));
        assert_eq!(f.orders.order_count(), 0);
    }

    #[tokio::test]
    async fn expired_session_is_abandoned() {
        let f = fixture(FakeGateway::default());
        let user_id = Uuid::new_v4();
        f.orders
            .record_pending_session("cs_exp", user_id, None)
            .expect("record failed");
        let payload = event(CHECKOUT_SESSION_EXPIRED, "cs_exp", user_id);

        let outcome = f
            .service
            .handle_webhook(&payload, Some(&signed(&payload)))
            .await
            .expect("webhook failed");

        assert_eq!(outcome, WebhookOutcome::Expired { abandoned: true });
        assert_eq!(
            f.orders.session_status("cs_exp").expect("status"),
            Some(SessionStatus::Abandoned)
        );
    }

    #[tokio::test]
    async fn missing_user_metadata_is_invalid_input() {
        let f = fixture(FakeGateway::default());
        let payload = serde_json::to_vec(&json!({
            "id": "evt_1",
            "type": CHECKOUT_SESSION_COMPLETED,
            "data": { "object": { "id": "cs_1", "payment_status": "paid" } }
        }))
        .expect("serialize");

        let result = f
            .service
            .handle_webhook(&payload, Some(&signed(&payload)))
            .await;

        assert!(matches!(result, Err(DomainError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn processor_outage_surfaces_as_payment_error() {
        let f = fixture(FakeGateway {
            unavailable: true,
            ..FakeGateway::default()
        });
        let payload = event(CHECKOUT_SESSION_COMPLETED, "cs_1", Uuid::new_v4());

        let result = f
            .service
            .handle_webhook(&payload, Some(&signed(&payload)))
            .await;

        assert!(matches!(result, Err(DomainError::Payment(_))));
        assert_eq!(f.orders.order_count(), 0);
    }
}
