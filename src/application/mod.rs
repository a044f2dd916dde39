pub mod cart_service;
pub mod checkout_service;
pub mod order_service;

pub use cart_service::CartService;
pub use checkout_service::{CheckoutService, CheckoutSettings};
pub use order_service::{OrderService, WebhookOutcome, WebhookSettings};

use crate::domain::errors::DomainError;

/// Runs blocking repository work off the async executor.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, DomainError>
where
    F: FnOnce() -> Result<T, DomainError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DomainError::Internal(e.to_string()))?
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::Utc;
    use uuid::Uuid;

    use crate::domain::cart::{apply_delta, target_quantity, CartLine, ProductSummary, QuantityChange};
    use crate::domain::checkout::{MaterializeOutcome, SessionStatus};
    use crate::domain::errors::DomainError;
    use crate::domain::order::{
        cash_on_delivery_order, ListResult, NewOrderInput, OrderView, PaymentDetails,
    };
    use crate::domain::ports::{CartRepository, OrderRepository};
    use crate::payment::{
        CheckoutSession, CheckoutSessionRequest, PaymentError, PaymentGateway, ProcessorProduct,
        SessionLineItem,
    };

    #[derive(Default)]
    pub struct InMemoryCartRepository {
        pub products: Mutex<HashMap<Uuid, ProductSummary>>,
        pub lines: Mutex<Vec<CartLine>>,
    }

    impl InMemoryCartRepository {
        pub fn with_product(&self, name: &str, price: i64, discount: i32) -> Uuid {
            let id = Uuid::new_v4();
            self.products.lock().unwrap().insert(
                id,
                ProductSummary {
                    id,
                    name: name.to_string(),
                    images: vec![format!("{name}.png")],
                    price,
                    discount,
                },
            );
            id
        }

        fn write(&self, index: usize, quantity: Option<i32>) -> QuantityChange {
            let mut lines = self.lines.lock().unwrap();
            match quantity {
                Some(q) => {
                    lines[index].quantity = q;
                    QuantityChange::Updated(lines[index].clone())
                }
                None => {
                    lines.remove(index);
                    QuantityChange::Removed
                }
            }
        }

        fn position(&self, user_id: Uuid, item_id: Uuid) -> Result<(usize, i32), DomainError> {
            self.lines
                .lock()
                .unwrap()
                .iter()
                .enumerate()
                .find(|(_, l)| l.id == item_id && l.user_id == user_id)
                .map(|(i, l)| (i, l.quantity))
                .ok_or_else(|| DomainError::NotFound("Cart item".to_string()))
        }
    }

    impl CartRepository for InMemoryCartRepository {
        fn list(&self, user_id: Uuid) -> Result<Vec<CartLine>, DomainError> {
            Ok(self
                .lines
                .lock()
                .unwrap()
                .iter()
                .filter(|l| l.user_id == user_id)
                .cloned()
                .collect())
        }

        fn add(&self, user_id: Uuid, product_id: Uuid) -> Result<CartLine, DomainError> {
            let product = self
                .products
                .lock()
                .unwrap()
                .get(&product_id)
                .cloned()
                .ok_or_else(|| DomainError::NotFound("Product".to_string()))?;
            let mut lines = self.lines.lock().unwrap();
            if lines
                .iter()
                .any(|l| l.user_id == user_id && l.product.id == product_id)
            {
                return Err(DomainError::Conflict("Item already in cart".to_string()));
            }
            let line = CartLine {
                id: Uuid::new_v4(),
                user_id,
                product,
                quantity: 1,
                created_at: Utc::now(),
            };
            lines.push(line.clone());
            Ok(line)
        }

        fn set_quantity(
            &self,
            user_id: Uuid,
            item_id: Uuid,
            quantity: i32,
            expected: Option<i32>,
        ) -> Result<QuantityChange, DomainError> {
            let (index, current) = self.position(user_id, item_id)?;
            if expected.is_some_and(|e| e != current) {
                return Err(DomainError::Conflict("Cart item quantity changed".to_string()));
            }
            Ok(self.write(index, target_quantity(quantity)))
        }

        fn adjust(
            &self,
            user_id: Uuid,
            item_id: Uuid,
            delta: i32,
        ) -> Result<QuantityChange, DomainError> {
            let (index, current) = self.position(user_id, item_id)?;
            Ok(self.write(index, apply_delta(current, delta)?))
        }

        fn remove(&self, user_id: Uuid, item_id: Uuid) -> Result<(), DomainError> {
            let (index, _) = self.position(user_id, item_id)?;
            self.lines.lock().unwrap().remove(index);
            Ok(())
        }
    }

    pub struct InMemoryOrderRepository {
        pub carts: Arc<InMemoryCartRepository>,
        pub emails: Mutex<HashMap<Uuid, String>>,
        pub addresses: Mutex<HashSet<(Uuid, Uuid)>>,
        pub sessions: Mutex<HashMap<String, SessionStatus>>,
        pub orders: Mutex<Vec<NewOrderInput>>,
    }

    impl InMemoryOrderRepository {
        pub fn new(carts: Arc<InMemoryCartRepository>) -> Self {
            Self {
                carts,
                emails: Mutex::default(),
                addresses: Mutex::default(),
                sessions: Mutex::default(),
                orders: Mutex::default(),
            }
        }

        pub fn with_address(&self, user_id: Uuid) -> Uuid {
            let id = Uuid::new_v4();
            self.addresses.lock().unwrap().insert((user_id, id));
            id
        }

        pub fn order_count(&self) -> usize {
            self.orders.lock().unwrap().len()
        }

        fn clear_cart(&self, user_id: Uuid) {
            self.carts
                .lines
                .lock()
                .unwrap()
                .retain(|l| l.user_id != user_id);
        }
    }

    fn view(input: NewOrderInput) -> OrderView {
        OrderView {
            id: Uuid::new_v4(),
            order_id: input.order_id,
            user_id: input.user_id,
            product_id: input.product_id,
            product_details: input.product_details,
            payment_id: input.payment_id,
            payment_status: input.payment_status,
            delivery_address: None,
            sub_total: input.sub_total,
            total: input.total,
            created_at: Utc::now(),
        }
    }

    impl OrderRepository for InMemoryOrderRepository {
        fn customer_email(&self, user_id: Uuid) -> Result<Option<String>, DomainError> {
            Ok(self.emails.lock().unwrap().get(&user_id).cloned())
        }

        fn has_address(&self, user_id: Uuid, address_id: Uuid) -> Result<bool, DomainError> {
            Ok(self.addresses.lock().unwrap().contains(&(user_id, address_id)))
        }

        fn place_cash_on_delivery(
            &self,
            user_id: Uuid,
            address_id: Uuid,
        ) -> Result<Vec<OrderView>, DomainError> {
            let lines = self.carts.list(user_id)?;
            if lines.is_empty() {
                return Err(DomainError::InvalidInput("Cart is empty".to_string()));
            }
            let inputs: Vec<NewOrderInput> = lines
                .iter()
                .map(|l| cash_on_delivery_order(user_id, address_id, l))
                .collect::<Result<_, _>>()?;
            self.orders.lock().unwrap().extend(inputs.iter().cloned());
            self.clear_cart(user_id);
            Ok(inputs.into_iter().map(view).collect())
        }

        fn record_pending_session(
            &self,
            session_id: &str,
            _user_id: Uuid,
            _address_id: Option<Uuid>,
        ) -> Result<(), DomainError> {
            self.sessions
                .lock()
                .unwrap()
                .entry(session_id.to_string())
                .or_insert(SessionStatus::Pending);
            Ok(())
        }

        fn session_status(&self, session_id: &str) -> Result<Option<SessionStatus>, DomainError> {
            Ok(self.sessions.lock().unwrap().get(session_id).copied())
        }

        fn materialize_paid_orders(
            &self,
            payment: &PaymentDetails,
            orders: Vec<NewOrderInput>,
        ) -> Result<MaterializeOutcome, DomainError> {
            {
                let mut sessions = self.sessions.lock().unwrap();
                if sessions.get(&payment.session_id) == Some(&SessionStatus::Confirmed) {
                    return Ok(MaterializeOutcome::Duplicate);
                }
                sessions.insert(payment.session_id.clone(), SessionStatus::Confirmed);
            }
            let inserted = orders.len();
            self.orders.lock().unwrap().extend(orders);
            let cart_cleared = inserted > 0;
            if cart_cleared {
                self.clear_cart(payment.user_id);
            }
            Ok(MaterializeOutcome::Materialized {
                orders: inserted,
                cart_cleared,
            })
        }

        fn abandon_session(&self, session_id: &str) -> Result<bool, DomainError> {
            let mut sessions = self.sessions.lock().unwrap();
            match sessions.get_mut(session_id) {
                Some(status) if *status == SessionStatus::Pending => {
                    *status = SessionStatus::Abandoned;
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        fn list(&self, user_id: Uuid, page: i64, limit: i64) -> Result<ListResult, DomainError> {
            let mine: Vec<NewOrderInput> = self
                .orders
                .lock()
                .unwrap()
                .iter()
                .filter(|o| o.user_id == user_id)
                .rev()
                .cloned()
                .collect();
            let total = mine.len() as i64;
            let items = mine
                .into_iter()
                .skip(((page - 1) * limit) as usize)
                .take(limit as usize)
                .map(view)
                .collect();
            Ok(ListResult { items, total })
        }
    }

    #[derive(Default)]
    pub struct FakeGateway {
        pub created: Mutex<Vec<CheckoutSessionRequest>>,
        pub line_items: Mutex<HashMap<String, Vec<SessionLineItem>>>,
        pub products: Mutex<HashMap<String, ProcessorProduct>>,
        pub unavailable: bool,
    }

    impl FakeGateway {
        /// Registers a processor product mirroring `product_id` and a
        /// completed line for it on `session_id`.
        pub fn with_line(&self, session_id: &str, product_id: Uuid, quantity: i32, amount_total: i64) {
            let processor_id = format!("prod_{}", product_id.simple());
            self.products.lock().unwrap().insert(
                processor_id.clone(),
                ProcessorProduct {
                    id: processor_id.clone(),
                    name: "Processor product".to_string(),
                    images: vec![],
                    product_ref: Some(product_id.to_string()),
                },
            );
            self.line_items
                .lock()
                .unwrap()
                .entry(session_id.to_string())
                .or_default()
                .push(SessionLineItem {
                    processor_product_id: processor_id,
                    quantity,
                    amount_total,
                });
        }

        fn check_available(&self) -> Result<(), PaymentError> {
            if self.unavailable {
                return Err(PaymentError::Api {
                    status: 503,
                    message: "processor unavailable".to_string(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl PaymentGateway for FakeGateway {
        async fn create_checkout_session(
            &self,
            request: &CheckoutSessionRequest,
        ) -> Result<CheckoutSession, PaymentError> {
            self.check_available()?;
            let mut created = self.created.lock().unwrap();
            created.push(request.clone());
            let id = format!("cs_test_{}", created.len());
            Ok(CheckoutSession {
                url: Some(format!("https://checkout.example/{id}")),
                id,
            })
        }

        async fn list_line_items(
            &self,
            session_id: &str,
        ) -> Result<Vec<SessionLineItem>, PaymentError> {
            self.check_available()?;
            Ok(self
                .line_items
                .lock()
                .unwrap()
                .get(session_id)
                .cloned()
                .unwrap_or_default())
        }

        async fn retrieve_product(&self, product_id: &str) -> Result<ProcessorProduct, PaymentError> {
            self.check_available()?;
            self.products
                .lock()
                .unwrap()
                .get(product_id)
                .cloned()
                .ok_or_else(|| PaymentError::Api {
                    status: 404,
                    message: format!("No such product: {product_id}"),
                })
        }
    }
}
