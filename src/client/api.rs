use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::handlers::cart::{CartItemResponse, QuantityChangeResponse};
use crate::handlers::{ApiResponse, USER_ID_HEADER};

pub const FALLBACK_MESSAGE: &str = "Something went wrong";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A failed cart request, reduced to the message shown to the shopper.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ClientError {
    pub message: String,
}

impl ClientError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn fallback() -> Self {
        Self::new(FALLBACK_MESSAGE)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        log::warn!("Cart request failed: {}", e);
        ClientError::fallback()
    }
}

#[async_trait]
pub trait CartApi: Send + Sync {
    async fn fetch_cart(&self, user_id: Uuid) -> Result<Vec<CartItemResponse>, ClientError>;

    /// Returns the confirmation message from the server.
    async fn add_item(&self, user_id: Uuid, product_id: Uuid) -> Result<String, ClientError>;

    async fn adjust_quantity(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        delta: i32,
    ) -> Result<QuantityChangeResponse, ClientError>;
}

/// [`CartApi`] over the service's REST endpoints.
pub struct HttpCartApi {
    http: Client,
    base_url: String,
}

impl HttpCartApi {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn send<T: DeserializeOwned>(
        &self,
        user_id: Uuid,
        request: RequestBuilder,
    ) -> Result<ApiResponse<T>, ClientError> {
        let response = request
            .header(USER_ID_HEADER, user_id.to_string())
            .send()
            .await?;
        if !response.status().is_success() {
            let body: Value = response.json().await.unwrap_or_default();
            let message = body["message"]
                .as_str()
                .filter(|m| !m.is_empty())
                .unwrap_or(FALLBACK_MESSAGE);
            return Err(ClientError::new(message));
        }
        Ok(response.json::<ApiResponse<T>>().await?)
    }
}

#[async_trait]
impl CartApi for HttpCartApi {
    async fn fetch_cart(&self, user_id: Uuid) -> Result<Vec<CartItemResponse>, ClientError> {
        let url = format!("{}/api/cart", self.base_url);
        let response = self.send(user_id, self.http.get(url)).await?;
        Ok(response.data)
    }

    async fn add_item(&self, user_id: Uuid, product_id: Uuid) -> Result<String, ClientError> {
        let url = format!("{}/api/cart", self.base_url);
        let request = self.http.post(url).json(&json!({ "productId": product_id }));
        let response: ApiResponse<CartItemResponse> = self.send(user_id, request).await?;
        Ok(response.message)
    }

    async fn adjust_quantity(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        delta: i32,
    ) -> Result<QuantityChangeResponse, ClientError> {
        let url = format!("{}/api/cart/{}/adjust", self.base_url, item_id);
        let request = self.http.post(url).json(&json!({ "delta": delta }));
        let response = self.send(user_id, request).await?;
        Ok(response.data)
    }
}
