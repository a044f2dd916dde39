use std::sync::Arc;

use uuid::Uuid;

use super::run_blocking;
use crate::domain::cart::CartLine;
use crate::domain::errors::DomainError;
use crate::domain::order::OrderView;
use crate::domain::ports::{CartRepository, OrderRepository};
use crate::domain::pricing::to_minor_units;
use crate::payment::{CheckoutSession, CheckoutSessionRequest, LineItemRequest, PaymentGateway};

#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    pub frontend_url: String,
    pub currency: String,
}

/// Starts a checkout, either settled on delivery or through the hosted
/// payment page.
pub struct CheckoutService<C, O> {
    carts: Arc<C>,
    orders: Arc<O>,
    gateway: Arc<dyn PaymentGateway>,
    settings: CheckoutSettings,
}

/// Processor line items for the cart: discounted unit price in minor units,
/// quantity adjustable down to one on the hosted page.
pub fn build_line_items(lines: &[CartLine]) -> Result<Vec<LineItemRequest>, DomainError> {
    lines
        .iter()
        .map(|line| {
            Ok(LineItemRequest {
                product_id: line.product.id,
                name: line.product.name.clone(),
                images: line.product.images.clone(),
                unit_amount: to_minor_units(line.product.final_price())?,
                quantity: line.quantity,
                adjustable_minimum: 1,
            })
        })
        .collect()
}

fn address_not_found() -> DomainError {
    DomainError::NotFound("Address".to_string())
}

impl<C: CartRepository, O: OrderRepository> CheckoutService<C, O> {
    pub fn new(
        carts: Arc<C>,
        orders: Arc<O>,
        gateway: Arc<dyn PaymentGateway>,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            carts,
            orders,
            gateway,
            settings,
        }
    }

    pub fn cash_on_delivery(
        &self,
        user_id: Uuid,
        address_id: Uuid,
    ) -> Result<Vec<OrderView>, DomainError> {
        if !self.orders.has_address(user_id, address_id)? {
            return Err(address_not_found());
        }
        let placed = self.orders.place_cash_on_delivery(user_id, address_id)?;
        log::info!(
            "Placed {} cash-on-delivery order(s) for user {}",
            placed.len(),
            user_id
        );
        Ok(placed)
    }

    /// Creates a hosted payment session for the current cart and records it
    /// as pending. Orders are only created once the processor confirms.
    pub async fn start_card_payment(
        &self,
        user_id: Uuid,
        address_id: Uuid,
    ) -> Result<CheckoutSession, DomainError> {
        let carts = Arc::clone(&self.carts);
        let orders = Arc::clone(&self.orders);
        let (lines, customer_email) = run_blocking(move || {
            if !orders.has_address(user_id, address_id)? {
                return Err(address_not_found());
            }
            Ok((carts.list(user_id)?, orders.customer_email(user_id)?))
        })
        .await?;

        if lines.is_empty() {
            return Err(DomainError::InvalidInput("Cart is empty".to_string()));
        }

        let request = CheckoutSessionRequest {
            currency: self.settings.currency.clone(),
            customer_email,
            user_id,
            address_id,
            line_items: build_line_items(&lines)?,
            success_url: format!("{}/success", self.settings.frontend_url),
            cancel_url: format!("{}/cancel", self.settings.frontend_url),
        };
        let session = self.gateway.create_checkout_session(&request).await?;

        let orders = Arc::clone(&self.orders);
        let session_id = session.id.clone();
        run_blocking(move || orders.record_pending_session(&session_id, user_id, Some(address_id)))
            .await?;

        log::info!(
            "Created checkout session {} for user {} ({} line(s))",
            session.id,
            user_id,
            request.line_items.len()
        );
        Ok(session)
    }
}
