use std::collections::HashMap;

use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::checkout::{MaterializeOutcome, SessionStatus};
use crate::domain::errors::DomainError;
use crate::domain::order::{
    cash_on_delivery_order, AddressView, ListResult, NewOrderInput, OrderView, PaymentDetails,
};
use crate::domain::ports::OrderRepository;
use crate::schema::{addresses, cart_items, checkout_sessions, orders, users};

use super::cart_repo::load_cart_lines;
use super::models::{AddressRow, CheckoutSessionRow, NewCheckoutSessionRow, NewOrderRow, OrderRow};

fn insert_orders(
    conn: &mut PgConnection,
    inputs: Vec<NewOrderInput>,
) -> Result<Vec<OrderRow>, DomainError> {
    if inputs.is_empty() {
        return Ok(vec![]);
    }

    let rows = inputs
        .into_iter()
        .map(|o| {
            Ok(NewOrderRow {
                id: Uuid::new_v4(),
                order_id: o.order_id,
                user_id: o.user_id,
                product_id: o.product_id,
                product_details: serde_json::to_value(&o.product_details)?,
                payment_id: o.payment_id,
                payment_status: o.payment_status,
                delivery_address_id: o.delivery_address_id,
                checkout_session_id: o.checkout_session_id,
                sub_total: o.sub_total,
                total: o.total,
            })
        })
        .collect::<Result<Vec<_>, DomainError>>()?;

    Ok(diesel::insert_into(orders::table)
        .values(&rows)
        .returning(OrderRow::as_returning())
        .get_results(conn)?)
}

fn clear_cart(conn: &mut PgConnection, user_id: Uuid) -> Result<usize, DomainError> {
    Ok(diesel::delete(cart_items::table.filter(cart_items::user_id.eq(user_id))).execute(conn)?)
}

fn load_addresses(
    conn: &mut PgConnection,
    ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, AddressView>, DomainError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = addresses::table
        .filter(addresses::id.eq_any(ids))
        .select(AddressRow::as_select())
        .load(conn)?;
    Ok(rows.into_iter().map(|a| (a.id, a.into())).collect())
}

/// Attaches delivery addresses to order rows, preserving row order.
fn to_views(conn: &mut PgConnection, rows: Vec<OrderRow>) -> Result<Vec<OrderView>, DomainError> {
    let address_ids: Vec<Uuid> = rows.iter().filter_map(|r| r.delivery_address_id).collect();
    let addresses = load_addresses(conn, address_ids)?;

    rows.into_iter()
        .map(|r| {
            Ok(OrderView {
                id: r.id,
                order_id: r.order_id,
                user_id: r.user_id,
                product_id: r.product_id,
                product_details: serde_json::from_value(r.product_details)?,
                payment_id: r.payment_id,
                payment_status: r.payment_status,
                delivery_address: r
                    .delivery_address_id
                    .and_then(|id| addresses.get(&id).cloned()),
                sub_total: r.sub_total,
                total: r.total,
                created_at: r.created_at,
            })
        })
        .collect()
}

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl OrderRepository for DieselOrderRepository {
    fn customer_email(&self, user_id: Uuid) -> Result<Option<String>, DomainError> {
        let mut conn = self.pool.get()?;
        Ok(users::table
            .find(user_id)
            .select(users::email)
            .first::<String>(&mut conn)
            .optional()?)
    }

    fn has_address(&self, user_id: Uuid, address_id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let count: i64 = addresses::table
            .filter(addresses::id.eq(address_id))
            .filter(addresses::user_id.eq(user_id))
            .count()
            .get_result(&mut conn)?;
        Ok(count > 0)
    }

    fn place_cash_on_delivery(
        &self,
        user_id: Uuid,
        address_id: Uuid,
    ) -> Result<Vec<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // Lock the cart so a concurrent checkout sees it already emptied.
            cart_items::table
                .filter(cart_items::user_id.eq(user_id))
                .select(cart_items::id)
                .for_update()
                .load::<Uuid>(conn)?;

            let lines = load_cart_lines(conn, user_id)?;
            if lines.is_empty() {
                return Err(DomainError::InvalidInput("Cart is empty".to_string()));
            }

            let inputs = lines
                .iter()
                .map(|line| cash_on_delivery_order(user_id, address_id, line))
                .collect::<Result<Vec<_>, DomainError>>()?;
            let rows = insert_orders(conn, inputs)?;
            clear_cart(conn, user_id)?;

            to_views(conn, rows)
        })
    }

    fn record_pending_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        address_id: Option<Uuid>,
    ) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        diesel::insert_into(checkout_sessions::table)
            .values(&NewCheckoutSessionRow {
                session_id: session_id.to_string(),
                user_id,
                address_id,
                status: SessionStatus::Pending.as_str().to_string(),
            })
            .on_conflict(checkout_sessions::session_id)
            .do_nothing()
            .execute(&mut conn)?;
        Ok(())
    }

    fn session_status(&self, session_id: &str) -> Result<Option<SessionStatus>, DomainError> {
        let mut conn = self.pool.get()?;
        let session = checkout_sessions::table
            .find(session_id)
            .select(CheckoutSessionRow::as_select())
            .first(&mut conn)
            .optional()?;
        session.map(|row| row.status.parse()).transpose()
    }

    fn materialize_paid_orders(
        &self,
        payment: &PaymentDetails,
        orders: Vec<NewOrderInput>,
    ) -> Result<MaterializeOutcome, DomainError> {
        let mut conn = self.pool.get()?;
        let confirmed = SessionStatus::Confirmed.as_str();

        conn.transaction::<_, DomainError, _>(|conn| {
            // Claim the session: only one delivery may move it to CONFIRMED.
            let claimed = diesel::update(
                checkout_sessions::table
                    .filter(checkout_sessions::session_id.eq(&payment.session_id))
                    .filter(checkout_sessions::status.ne(confirmed)),
            )
            .set((
                checkout_sessions::status.eq(confirmed),
                checkout_sessions::updated_at.eq(Utc::now()),
            ))
            .execute(conn)?;

            if claimed == 0 {
                let inserted = diesel::insert_into(checkout_sessions::table)
                    .values(&NewCheckoutSessionRow {
                        session_id: payment.session_id.clone(),
                        user_id: payment.user_id,
                        address_id: payment.address_id,
                        status: confirmed.to_string(),
                    })
                    .on_conflict(checkout_sessions::session_id)
                    .do_nothing()
                    .execute(conn)?;
                if inserted == 0 {
                    return Ok(MaterializeOutcome::Duplicate);
                }
            }

            let rows = insert_orders(conn, orders)?;
            let cart_cleared = !rows.is_empty();
            if cart_cleared {
                clear_cart(conn, payment.user_id)?;
            }

            Ok(MaterializeOutcome::Materialized {
                orders: rows.len(),
                cart_cleared,
            })
        })
    }

    fn abandon_session(&self, session_id: &str) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let updated = diesel::update(
            checkout_sessions::table
                .filter(checkout_sessions::session_id.eq(session_id))
                .filter(checkout_sessions::status.eq(SessionStatus::Pending.as_str())),
        )
        .set((
            checkout_sessions::status.eq(SessionStatus::Abandoned.as_str()),
            checkout_sessions::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;
        Ok(updated > 0)
    }

    fn list(&self, user_id: Uuid, page: i64, limit: i64) -> Result<ListResult, DomainError> {
        let mut conn = self.pool.get()?;

        let offset = (page - 1) * limit;
        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = orders::table
                .filter(orders::user_id.eq(user_id))
                .count()
                .get_result(conn)?;

            let rows = orders::table
                .filter(orders::user_id.eq(user_id))
                .select(OrderRow::as_select())
                .order((orders::created_at.desc(), orders::id.desc()))
                .limit(limit)
                .offset(offset)
                .load(conn)?;

            Ok(ListResult {
                items: to_views(conn, rows)?,
                total,
            })
        })
    }
}
