use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::cart::{apply_delta, target_quantity, CartLine, QuantityChange};
use crate::domain::errors::DomainError;
use crate::domain::ports::CartRepository;
use crate::schema::{cart_items, products};

use super::models::{CartItemRow, NewCartItemRow, ProductRow};

fn to_line(item: CartItemRow, product: ProductRow) -> CartLine {
    CartLine {
        id: item.id,
        user_id: item.user_id,
        product: product.into(),
        quantity: item.quantity,
        created_at: item.created_at,
    }
}

fn item_not_found() -> DomainError {
    DomainError::NotFound("Cart item".to_string())
}

/// The user's cart joined with products, oldest first.
pub(crate) fn load_cart_lines(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Vec<CartLine>, DomainError> {
    let rows = cart_items::table
        .inner_join(products::table)
        .filter(cart_items::user_id.eq(user_id))
        .order((cart_items::created_at.asc(), cart_items::id.asc()))
        .select((CartItemRow::as_select(), ProductRow::as_select()))
        .load::<(CartItemRow, ProductRow)>(conn)?;

    Ok(rows
        .into_iter()
        .map(|(item, product)| to_line(item, product))
        .collect())
}

/// Row-locks the item for the rest of the transaction.
fn lock_item(
    conn: &mut PgConnection,
    user_id: Uuid,
    item_id: Uuid,
) -> Result<CartItemRow, DomainError> {
    cart_items::table
        .filter(cart_items::id.eq(item_id))
        .filter(cart_items::user_id.eq(user_id))
        .select(CartItemRow::as_select())
        .for_update()
        .get_result(conn)
        .optional()?
        .ok_or_else(item_not_found)
}

fn write_quantity(
    conn: &mut PgConnection,
    item: CartItemRow,
    quantity: Option<i32>,
) -> Result<QuantityChange, DomainError> {
    let Some(quantity) = quantity else {
        diesel::delete(cart_items::table.find(item.id)).execute(conn)?;
        return Ok(QuantityChange::Removed);
    };

    let updated = diesel::update(cart_items::table.find(item.id))
        .set((
            cart_items::quantity.eq(quantity),
            cart_items::updated_at.eq(Utc::now()),
        ))
        .returning(CartItemRow::as_returning())
        .get_result(conn)?;
    let product = products::table
        .find(updated.product_id)
        .select(ProductRow::as_select())
        .first(conn)?;

    Ok(QuantityChange::Updated(to_line(updated, product)))
}

#[derive(Clone)]
pub struct DieselCartRepository {
    pool: DbPool,
}

impl DieselCartRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CartRepository for DieselCartRepository {
    fn list(&self, user_id: Uuid) -> Result<Vec<CartLine>, DomainError> {
        let mut conn = self.pool.get()?;
        load_cart_lines(&mut conn, user_id)
    }

    fn add(&self, user_id: Uuid, product_id: Uuid) -> Result<CartLine, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let product = products::table
                .find(product_id)
                .select(ProductRow::as_select())
                .first(conn)
                .optional()?
                .ok_or_else(|| DomainError::NotFound("Product".to_string()))?;

            let inserted = diesel::insert_into(cart_items::table)
                .values(&NewCartItemRow {
                    id: Uuid::new_v4(),
                    user_id,
                    product_id,
                    quantity: 1,
                })
                .on_conflict((cart_items::user_id, cart_items::product_id))
                .do_nothing()
                .returning(CartItemRow::as_returning())
                .get_result(conn)
                .optional()?;

            match inserted {
                Some(item) => Ok(to_line(item, product)),
                None => Err(DomainError::Conflict("Item already in cart".to_string())),
            }
        })
    }

    fn set_quantity(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        quantity: i32,
        expected: Option<i32>,
    ) -> Result<QuantityChange, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let item = lock_item(conn, user_id, item_id)?;
            if let Some(expected) = expected {
                if item.quantity != expected {
                    return Err(DomainError::Conflict(format!(
                        "Cart item quantity changed (expected {}, found {})",
                        expected, item.quantity
                    )));
                }
            }
            write_quantity(conn, item, target_quantity(quantity))
        })
    }

    fn adjust(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        delta: i32,
    ) -> Result<QuantityChange, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let item = lock_item(conn, user_id, item_id)?;
            let next = apply_delta(item.quantity, delta)?;
            write_quantity(conn, item, next)
        })
    }

    fn remove(&self, user_id: Uuid, item_id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        let deleted = diesel::delete(
            cart_items::table
                .filter(cart_items::id.eq(item_id))
                .filter(cart_items::user_id.eq(user_id)),
        )
        .execute(&mut conn)?;

        if deleted == 0 {
            return Err(item_not_found());
        }
        Ok(())
    }
}
