use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::gateway::{
    CheckoutSession, CheckoutSessionRequest, PaymentError, PaymentGateway, ProcessorProduct,
    SessionLineItem,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const LINE_ITEMS_PAGE_SIZE: u32 = 100;

/// Stripe-compatible hosted checkout client (form-encoded requests, bearer
/// secret key).
pub struct StripeGateway {
    http: Client,
    api_base: String,
    secret_key: String,
}

impl StripeGateway {
    pub fn new(api_base: &str, secret_key: &str) -> Result<Self, PaymentError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, PaymentError> {
        let response = request.bearer_auth(&self.secret_key).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or_default();
            let message = body["error"]["message"]
                .as_str()
                .unwrap_or("unknown error")
                .to_string();
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| PaymentError::Decode(e.to_string()))
    }
}

/// Flattens a session request into the bracketed form fields the API expects.
pub fn session_form(request: &CheckoutSessionRequest) -> Vec<(String, String)> {
    let mut form: Vec<(String, String)> = vec![
        ("mode".into(), "payment".into()),
        ("submit_type".into(), "pay".into()),
        ("payment_method_types[0]".into(), "card".into()),
        ("success_url".into(), request.success_url.clone()),
        ("cancel_url".into(), request.cancel_url.clone()),
        ("metadata[userId]".into(), request.user_id.to_string()),
        ("metadata[addressId]".into(), request.address_id.to_string()),
    ];
    if let Some(email) = &request.customer_email {
        form.push(("customer_email".into(), email.clone()));
    }

    for (i, item) in request.line_items.iter().enumerate() {
        let prefix = format!("line_items[{i}]");
        form.push((
            format!("{prefix}[price_data][currency]"),
            request.currency.clone(),
        ));
        form.push((
            format!("{prefix}[price_data][unit_amount]"),
            item.unit_amount.to_string(),
        ));
        form.push((
            format!("{prefix}[price_data][product_data][name]"),
            item.name.clone(),
        ));
        for (j, image) in item.images.iter().enumerate() {
            form.push((
                format!("{prefix}[price_data][product_data][images][{j}]"),
                image.clone(),
            ));
        }
        form.push((
            format!("{prefix}[price_data][product_data][metadata][productId]"),
            item.product_id.to_string(),
        ));
        form.push((format!("{prefix}[quantity]"), item.quantity.to_string()));
        form.push((
            format!("{prefix}[adjustable_quantity][enabled]"),
            "true".into(),
        ));
        form.push((
            format!("{prefix}[adjustable_quantity][minimum]"),
            item.adjustable_minimum.to_string(),
        ));
    }
    form
}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SessionBody {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LineItemList {
    data: Vec<LineItemBody>,
}

#[derive(Debug, Deserialize)]
struct LineItemBody {
    #[serde(default)]
    quantity: Option<i32>,
    amount_total: i64,
    price: Option<PriceBody>,
}

#[derive(Debug, Deserialize)]
struct PriceBody {
    product: String,
}

#[derive(Debug, Deserialize)]
struct ProductBody {
    id: String,
    name: String,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    metadata: ProductMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct ProductMetadata {
    #[serde(rename = "productId")]
    product_id: Option<String>,
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let body: SessionBody = self
            .send(
                self.http
                    .post(format!("{}/v1/checkout/sessions", self.api_base))
                    .form(&session_form(request)),
            )
            .await?;
        Ok(CheckoutSession {
            id: body.id,
            url: body.url,
        })
    }

    async fn list_line_items(&self, session_id: &str) -> Result<Vec<SessionLineItem>, PaymentError> {
        let list: LineItemList = self
            .send(
                self.http
                    .get(format!(
                        "{}/v1/checkout/sessions/{}/line_items",
                        self.api_base, session_id
                    ))
                    .query(&[("limit", LINE_ITEMS_PAGE_SIZE)]),
            )
            .await?;

        list.data
            .into_iter()
            .map(|item| {
                let price = item.price.ok_or_else(|| {
                    PaymentError::Decode("line item without price".to_string())
                })?;
                Ok(SessionLineItem {
                    processor_product_id: price.product,
                    quantity: item.quantity.unwrap_or(1),
                    amount_total: item.amount_total,
                })
            })
            .collect()
    }

    async fn retrieve_product(&self, product_id: &str) -> Result<ProcessorProduct, PaymentError> {
        let body: ProductBody = self
            .send(
                self.http
                    .get(format!("{}/v1/products/{}", self.api_base, product_id)),
            )
            .await?;
        Ok(ProcessorProduct {
            id: body.id,
            name: body.name,
            images: body.images,
            product_ref: body.metadata.product_id,
        })
    }
}
