use uuid::Uuid;

use crate::domain::cart::{CartLine, QuantityChange};
use crate::domain::errors::DomainError;
use crate::domain::ports::CartRepository;

pub struct CartService<R> {
    repo: R,
}

impl<R: CartRepository> CartService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list_items(&self, user_id: Uuid) -> Result<Vec<CartLine>, DomainError> {
        self.repo.list(user_id)
    }

    pub fn add_item(&self, user_id: Uuid, product_id: Uuid) -> Result<CartLine, DomainError> {
        let line = self.repo.add(user_id, product_id)?;
        log::info!("User {} added product {} to cart", user_id, product_id);
        Ok(line)
    }

    pub fn update_quantity(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        quantity: i32,
        expected: Option<i32>,
    ) -> Result<QuantityChange, DomainError> {
        if quantity < 0 {
            return Err(DomainError::InvalidInput(format!(
                "quantity must not be negative (got {quantity})"
            )));
        }
        if expected.is_some_and(|e| e < 1) {
            return Err(DomainError::InvalidInput(
                "expected quantity must be at least 1".to_string(),
            ));
        }
        self.repo.set_quantity(user_id, item_id, quantity, expected)
    }

    pub fn adjust_quantity(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        delta: i32,
    ) -> Result<QuantityChange, DomainError> {
        if delta == 0 {
            return Err(DomainError::InvalidInput("delta must not be zero".to_string()));
        }
        self.repo.adjust(user_id, item_id, delta)
    }

    pub fn remove_item(&self, user_id: Uuid, item_id: Uuid) -> Result<(), DomainError> {
        self.repo.remove(user_id, item_id)?;
        log::info!("User {} removed cart item {}", user_id, item_id);
        Ok(())
    }
}
