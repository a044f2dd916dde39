use uuid::Uuid;

use super::cart::{CartLine, QuantityChange};
use super::checkout::{MaterializeOutcome, SessionStatus};
use super::errors::DomainError;
use super::order::{ListResult, NewOrderInput, OrderView, PaymentDetails};

pub trait CartRepository: Send + Sync + 'static {
    fn list(&self, user_id: Uuid) -> Result<Vec<CartLine>, DomainError>;
    fn add(&self, user_id: Uuid, product_id: Uuid) -> Result<CartLine, DomainError>;
    /// Sets an absolute quantity; `quantity <= 0` removes the item. With
    /// `expected` set, the write only applies if the stored quantity matches.
    fn set_quantity(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        quantity: i32,
        expected: Option<i32>,
    ) -> Result<QuantityChange, DomainError>;
    /// Atomic read-modify-write of the stored quantity.
    fn adjust(&self, user_id: Uuid, item_id: Uuid, delta: i32)
        -> Result<QuantityChange, DomainError>;
    fn remove(&self, user_id: Uuid, item_id: Uuid) -> Result<(), DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    fn customer_email(&self, user_id: Uuid) -> Result<Option<String>, DomainError>;
    fn has_address(&self, user_id: Uuid, address_id: Uuid) -> Result<bool, DomainError>;
    /// Turns every cart line into an order and empties the cart, atomically.
    fn place_cash_on_delivery(
        &self,
        user_id: Uuid,
        address_id: Uuid,
    ) -> Result<Vec<OrderView>, DomainError>;
    fn record_pending_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        address_id: Option<Uuid>,
    ) -> Result<(), DomainError>;
    fn session_status(&self, session_id: &str) -> Result<Option<SessionStatus>, DomainError>;
    /// Confirms the session, inserts `orders` and clears the cart if anything
    /// was inserted. A session that is already confirmed yields `Duplicate`.
    fn materialize_paid_orders(
        &self,
        payment: &PaymentDetails,
        orders: Vec<NewOrderInput>,
    ) -> Result<MaterializeOutcome, DomainError>;
    /// Marks a pending session abandoned; `false` if it was not pending.
    fn abandon_session(&self, session_id: &str) -> Result<bool, DomainError>;
    fn list(&self, user_id: Uuid, page: i64, limit: i64) -> Result<ListResult, DomainError>;
}
