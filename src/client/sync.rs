use std::collections::HashSet;
use std::sync::Mutex;

use uuid::Uuid;

use super::api::{CartApi, ClientError};
use super::notify::Notifier;
use crate::handlers::cart::CartItemResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartOperation {
    Add,
    Increase,
    Decrease,
}

/// One control's pending request: `target` is the product for `Add` and the
/// cart item otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InFlightKey {
    pub user_id: Uuid,
    pub operation: CartOperation,
    pub target: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Applied,
    /// The same control already has a request outstanding; nothing was sent.
    AlreadyInFlight,
    /// The request failed; the message has been shown to the shopper.
    Failed(String),
}

struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<InFlightKey>>,
    key: InFlightKey,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut set) = self.in_flight.lock() {
            set.remove(&self.key);
        }
    }
}

/// Keeps one shopper's cart view in step with the server. Every mutation is
/// followed by a refetch of the authoritative cart.
pub struct CartSync<A, N> {
    api: A,
    notifier: N,
    user_id: Uuid,
    cart: Mutex<Vec<CartItemResponse>>,
    in_flight: Mutex<HashSet<InFlightKey>>,
}

impl<A: CartApi, N: Notifier> CartSync<A, N> {
    pub fn new(api: A, notifier: N, user_id: Uuid) -> Self {
        Self {
            api,
            notifier,
            user_id,
            cart: Mutex::new(Vec::new()),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn items(&self) -> Vec<CartItemResponse> {
        self.cart.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// The cart entry holding `product_id`, if any.
    pub fn find_item(&self, product_id: Uuid) -> Option<CartItemResponse> {
        self.cart
            .lock()
            .ok()?
            .iter()
            .find(|item| item.product.id == product_id)
            .cloned()
    }

    pub fn is_loading(&self, operation: CartOperation, target: Uuid) -> bool {
        let key = self.key(operation, target);
        self.in_flight
            .lock()
            .map(|set| set.contains(&key))
            .unwrap_or(false)
    }

    pub async fn refresh(&self) -> Result<(), ClientError> {
        let items = self.api.fetch_cart(self.user_id).await?;
        if let Ok(mut cart) = self.cart.lock() {
            *cart = items;
        }
        Ok(())
    }

    pub async fn add(&self, product_id: Uuid) -> SyncOutcome {
        let Some(_guard) = self.begin(CartOperation::Add, product_id) else {
            return SyncOutcome::AlreadyInFlight;
        };
        if self.find_item(product_id).is_some() {
            return self.fail(ClientError::new("Item already in cart"));
        }
        match self.api.add_item(self.user_id, product_id).await {
            Ok(message) => self.applied(&message).await,
            Err(e) => self.fail(e),
        }
    }

    /// Adds one unit server-side; the server applies the increment to the
    /// stored quantity, not to this client's snapshot.
    pub async fn increase(&self, item_id: Uuid) -> SyncOutcome {
        let Some(_guard) = self.begin(CartOperation::Increase, item_id) else {
            return SyncOutcome::AlreadyInFlight;
        };
        match self.api.adjust_quantity(self.user_id, item_id, 1).await {
            Ok(_) => self.applied("Item quantity increased").await,
            Err(e) => self.fail(e),
        }
    }

    /// Removes one unit server-side. The server deletes the item when the
    /// stored quantity reaches zero.
    pub async fn decrease(&self, item_id: Uuid) -> SyncOutcome {
        let Some(_guard) = self.begin(CartOperation::Decrease, item_id) else {
            return SyncOutcome::AlreadyInFlight;
        };
        match self.api.adjust_quantity(self.user_id, item_id, -1).await {
            Ok(change) if change.removed => self.applied("Item removed from cart").await,
            Ok(_) => self.applied("Item quantity decreased").await,
            Err(e) => self.fail(e),
        }
    }

    fn key(&self, operation: CartOperation, target: Uuid) -> InFlightKey {
        InFlightKey {
            user_id: self.user_id,
            operation,
            target,
        }
    }

    fn begin(&self, operation: CartOperation, target: Uuid) -> Option<InFlightGuard<'_>> {
        let key = self.key(operation, target);
        let mut set = self.in_flight.lock().ok()?;
        if !set.insert(key) {
            return None;
        }
        Some(InFlightGuard {
            in_flight: &self.in_flight,
            key,
        })
    }

    async fn applied(&self, message: &str) -> SyncOutcome {
        self.notifier.success(message);
        if let Err(e) = self.refresh().await {
            log::warn!("Cart refresh after mutation failed: {}", e);
        }
        SyncOutcome::Applied
    }

    fn fail(&self, error: ClientError) -> SyncOutcome {
        self.notifier.error(&error.message);
        SyncOutcome::Failed(error.message)
    }
}
