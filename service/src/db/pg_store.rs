// service/src/db/pg_store.rs

//! PostgreSQL adapter for the core's transactional store port.
//!
//! Each [`StoreTx`] owns one database transaction. Leases are row locks taken
//! with `SELECT ... FOR UPDATE`; multi-row leases sort by id so concurrent
//! checkouts acquire them in the same order.

use super::store_error;
use crate::models::order::ORDER_COLUMNS;
use crate::models::stock_unit::STOCK_UNIT_COLUMNS;
use crate::models::ticket::TICKET_COLUMNS;
use crate::models::{CartItemRow, CartRow, OrderItemRow, OrderRow, StockUnitRow, TicketRow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use ticketing_core::models::{
  Cart, CartItem, Order, OrderItem, OrderStatus, StockUnit, Ticket, TicketFilter, TicketStatus,
};
use ticketing_core::ports::{StoreTx, TicketingStore};
use ticketing_core::{StoreError, StoreResult};
use tracing::debug;
use uuid::Uuid;

const CART_ITEM_COLUMNS: &str = "id, cart_id, stock_unit_ref, quantity, price_snapshot_cents, currency";
const ORDER_ITEM_COLUMNS: &str = "id, order_id, stock_unit_ref, quantity, price_at_purchase_cents, currency";

fn column_value(column: &str, value: u32) -> StoreResult<i32> {
  i32::try_from(value).map_err(|_| StoreError::CheckViolation(format!("{} value {} is out of range", column, value)))
}

fn convert_all<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
  T: TryFrom<R, Error = StoreError>,
{
  rows.into_iter().map(T::try_from).collect()
}

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl TicketingStore for PgStore {
  async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
    let tx = self.pool.begin().await.map_err(store_error)?;
    Ok(Box::new(PgTx { tx }))
  }
}

/// Dropping an uncommitted `sqlx::Transaction` rolls it back.
pub struct PgTx {
  tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
  async fn find_stock_unit(&mut self, id: Uuid) -> StoreResult<Option<StockUnit>> {
    let sql = format!("SELECT {} FROM stock_units WHERE id = $1", STOCK_UNIT_COLUMNS);
    let row = sqlx::query_as::<_, StockUnitRow>(&sql)
      .bind(id)
      .fetch_optional(&mut *self.tx)
      .await
      .map_err(store_error)?;
    row.map(StockUnit::try_from).transpose()
  }

  async fn lock_stock_units(&mut self, ids: &[Uuid]) -> StoreResult<Vec<StockUnit>> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    let sql = format!(
      "SELECT {} FROM stock_units WHERE id = ANY($1) ORDER BY id FOR UPDATE",
      STOCK_UNIT_COLUMNS
    );
    let rows = sqlx::query_as::<_, StockUnitRow>(&sql)
      .bind(ids)
      .fetch_all(&mut *self.tx)
      .await
      .map_err(store_error)?;
    convert_all(rows)
  }

  async fn list_stock_units(&mut self, event_ref: Uuid) -> StoreResult<Vec<StockUnit>> {
    let sql = format!(
      "SELECT {} FROM stock_units WHERE event_ref = $1 ORDER BY price_cents, name",
      STOCK_UNIT_COLUMNS
    );
    let rows = sqlx::query_as::<_, StockUnitRow>(&sql)
      .bind(event_ref)
      .fetch_all(&mut *self.tx)
      .await
      .map_err(store_error)?;
    convert_all(rows)
  }

  async fn insert_stock_unit(&mut self, unit: &StockUnit) -> StoreResult<()> {
    let sql = format!(
      "INSERT INTO stock_units ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
      STOCK_UNIT_COLUMNS
    );
    sqlx::query(&sql)
      .bind(unit.id)
      .bind(unit.event_ref)
      .bind(&unit.name)
      .bind(&unit.description)
      .bind(unit.price.amount_cents)
      .bind(&unit.price.currency)
      .bind(column_value("total_quantity", unit.total_quantity)?)
      .bind(column_value("sold_count", unit.sold_count)?)
      .bind(column_value("min_per_order", unit.min_per_order)?)
      .bind(column_value("max_per_order", unit.max_per_order)?)
      .bind(unit.sale_window.start)
      .bind(unit.sale_window.end)
      .execute(&mut *self.tx)
      .await
      .map_err(store_error)?;
    Ok(())
  }

  async fn update_stock_unit(&mut self, unit: &StockUnit) -> StoreResult<()> {
    sqlx::query(
      "UPDATE stock_units SET name = $2, description = $3, price_cents = $4, currency = $5, total_quantity = $6, \
       sold_count = $7, min_per_order = $8, max_per_order = $9, sale_start = $10, sale_end = $11 WHERE id = $1",
    )
    .bind(unit.id)
    .bind(&unit.name)
    .bind(&unit.description)
    .bind(unit.price.amount_cents)
    .bind(&unit.price.currency)
    .bind(column_value("total_quantity", unit.total_quantity)?)
    .bind(column_value("sold_count", unit.sold_count)?)
    .bind(column_value("min_per_order", unit.min_per_order)?)
    .bind(column_value("max_per_order", unit.max_per_order)?)
    .bind(unit.sale_window.start)
    .bind(unit.sale_window.end)
    .execute(&mut *self.tx)
    .await
    .map_err(store_error)?;
    Ok(())
  }

  async fn delete_stock_unit(&mut self, id: Uuid) -> StoreResult<bool> {
    // cart_items cascade on the foreign key
    let result = sqlx::query("DELETE FROM stock_units WHERE id = $1")
      .bind(id)
      .execute(&mut *self.tx)
      .await
      .map_err(store_error)?;
    Ok(result.rows_affected() > 0)
  }

  async fn adjust_sold(&mut self, id: Uuid, delta: i64) -> StoreResult<()> {
    let delta = i32::try_from(delta).map_err(|_| StoreError::CheckViolation(format!("sold delta {} is out of range", delta)))?;
    let result = sqlx::query("UPDATE stock_units SET sold_count = sold_count + $2 WHERE id = $1")
      .bind(id)
      .bind(delta)
      .execute(&mut *self.tx)
      .await
      .map_err(store_error)?;
    if result.rows_affected() == 0 {
      return Err(StoreError::Corrupt(format!("stock unit {} vanished during sale", id)));
    }
    Ok(())
  }

  async fn find_cart(&mut self, owner_id: Uuid) -> StoreResult<Option<Cart>> {
    let row = sqlx::query_as::<_, CartRow>("SELECT id, owner_id, expires_at FROM carts WHERE owner_id = $1")
      .bind(owner_id)
      .fetch_optional(&mut *self.tx)
      .await
      .map_err(store_error)?;
    Ok(row.map(Cart::from))
  }

  async fn lock_cart(&mut self, owner_id: Uuid) -> StoreResult<Option<Cart>> {
    let row =
      sqlx::query_as::<_, CartRow>("SELECT id, owner_id, expires_at FROM carts WHERE owner_id = $1 FOR UPDATE")
        .bind(owner_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(store_error)?;
    Ok(row.map(Cart::from))
  }

  async fn insert_cart_if_absent(&mut self, cart: &Cart) -> StoreResult<Cart> {
    // A concurrent insert for the same owner makes this wait for that
    // transaction, then do nothing; the locked read below sees its row.
    let inserted = sqlx::query(
      "INSERT INTO carts (id, owner_id, expires_at) VALUES ($1, $2, $3) ON CONFLICT (owner_id) DO NOTHING",
    )
    .bind(cart.id)
    .bind(cart.owner_id)
    .bind(cart.expires_at)
    .execute(&mut *self.tx)
    .await
    .map_err(store_error)?;
    if inserted.rows_affected() == 0 {
      debug!(owner = %cart.owner_id, "Cart already present for owner.");
    }
    self
      .lock_cart(cart.owner_id)
      .await?
      .ok_or_else(|| StoreError::Corrupt(format!("cart of owner {} missing after insert", cart.owner_id)))
  }

  async fn set_cart_expiry(&mut self, cart_id: Uuid, expires_at: DateTime<Utc>) -> StoreResult<()> {
    sqlx::query("UPDATE carts SET expires_at = $2 WHERE id = $1")
      .bind(cart_id)
      .bind(expires_at)
      .execute(&mut *self.tx)
      .await
      .map_err(store_error)?;
    Ok(())
  }

  async fn cart_items(&mut self, cart_id: Uuid) -> StoreResult<Vec<CartItem>> {
    let sql = format!(
      "SELECT {} FROM cart_items WHERE cart_id = $1 ORDER BY stock_unit_ref",
      CART_ITEM_COLUMNS
    );
    let rows = sqlx::query_as::<_, CartItemRow>(&sql)
      .bind(cart_id)
      .fetch_all(&mut *self.tx)
      .await
      .map_err(store_error)?;
    convert_all(rows)
  }

  async fn reserved_quantity(&mut self, stock_unit_ref: Uuid, now: DateTime<Utc>) -> StoreResult<u32> {
    let held: i64 = sqlx::query_scalar(
      "SELECT COALESCE(SUM(ci.quantity), 0)::BIGINT FROM cart_items ci \
       JOIN carts c ON c.id = ci.cart_id WHERE ci.stock_unit_ref = $1 AND c.expires_at > $2",
    )
    .bind(stock_unit_ref)
    .bind(now)
    .fetch_one(&mut *self.tx)
    .await
    .map_err(store_error)?;
    u32::try_from(held).map_err(|_| StoreError::Corrupt(format!("held quantity {} out of range", held)))
  }

  async fn insert_cart_item(&mut self, item: &CartItem) -> StoreResult<()> {
    let sql = format!("INSERT INTO cart_items ({}) VALUES ($1, $2, $3, $4, $5, $6)", CART_ITEM_COLUMNS);
    sqlx::query(&sql)
      .bind(item.id)
      .bind(item.cart_id)
      .bind(item.stock_unit_ref)
      .bind(column_value("quantity", item.quantity)?)
      .bind(item.price_snapshot.amount_cents)
      .bind(&item.price_snapshot.currency)
      .execute(&mut *self.tx)
      .await
      .map_err(store_error)?;
    Ok(())
  }

  async fn set_cart_item_quantity(&mut self, item_id: Uuid, quantity: u32) -> StoreResult<()> {
    sqlx::query("UPDATE cart_items SET quantity = $2 WHERE id = $1")
      .bind(item_id)
      .bind(column_value("quantity", quantity)?)
      .execute(&mut *self.tx)
      .await
      .map_err(store_error)?;
    Ok(())
  }

  async fn delete_cart_item(&mut self, cart_id: Uuid, item_id: Uuid) -> StoreResult<bool> {
    let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND cart_id = $2")
      .bind(item_id)
      .bind(cart_id)
      .execute(&mut *self.tx)
      .await
      .map_err(store_error)?;
    Ok(result.rows_affected() > 0)
  }

  async fn clear_cart_items(&mut self, cart_id: Uuid) -> StoreResult<u64> {
    let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
      .bind(cart_id)
      .execute(&mut *self.tx)
      .await
      .map_err(store_error)?;
    Ok(result.rows_affected())
  }

  async fn insert_order(&mut self, order: &Order) -> StoreResult<()> {
    let sql = format!("INSERT INTO orders ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)", ORDER_COLUMNS);
    sqlx::query(&sql)
      .bind(order.id)
      .bind(&order.public_code)
      .bind(order.owner_id)
      .bind(order.total.amount_cents)
      .bind(&order.total.currency)
      .bind(order.status.as_str())
      .bind(&order.payment_ref)
      .bind(Json(&order.billing_address))
      .bind(order.created_at)
      .execute(&mut *self.tx)
      .await
      .map_err(store_error)?;
    Ok(())
  }

  async fn insert_order_items(&mut self, items: &[OrderItem]) -> StoreResult<()> {
    if items.is_empty() {
      return Ok(());
    }
    let quantities = items
      .iter()
      .map(|item| column_value("quantity", item.quantity))
      .collect::<StoreResult<Vec<_>>>()?;
    let mut builder = QueryBuilder::<Postgres>::new(format!("INSERT INTO order_items ({}) ", ORDER_ITEM_COLUMNS));
    builder.push_values(items.iter().zip(quantities), |mut row, (item, quantity)| {
      row
        .push_bind(item.id)
        .push_bind(item.order_id)
        .push_bind(item.stock_unit_ref)
        .push_bind(quantity)
        .push_bind(item.price_at_purchase.amount_cents)
        .push_bind(item.price_at_purchase.currency.clone());
    });
    builder.build().execute(&mut *self.tx).await.map_err(store_error)?;
    Ok(())
  }

  async fn find_order(&mut self, order_id: Uuid) -> StoreResult<Option<Order>> {
    let sql = format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS);
    let row = sqlx::query_as::<_, OrderRow>(&sql)
      .bind(order_id)
      .fetch_optional(&mut *self.tx)
      .await
      .map_err(store_error)?;
    row.map(Order::try_from).transpose()
  }

  async fn lock_order(&mut self, order_id: Uuid) -> StoreResult<Option<Order>> {
    let sql = format!("SELECT {} FROM orders WHERE id = $1 FOR UPDATE", ORDER_COLUMNS);
    let row = sqlx::query_as::<_, OrderRow>(&sql)
      .bind(order_id)
      .fetch_optional(&mut *self.tx)
      .await
      .map_err(store_error)?;
    row.map(Order::try_from).transpose()
  }

  async fn order_items(&mut self, order_id: Uuid) -> StoreResult<Vec<OrderItem>> {
    let sql = format!(
      "SELECT {} FROM order_items WHERE order_id = $1 ORDER BY stock_unit_ref",
      ORDER_ITEM_COLUMNS
    );
    let rows = sqlx::query_as::<_, OrderItemRow>(&sql)
      .bind(order_id)
      .fetch_all(&mut *self.tx)
      .await
      .map_err(store_error)?;
    convert_all(rows)
  }

  async fn list_orders(&mut self, owner_id: Uuid, offset: u64, limit: u32) -> StoreResult<(Vec<Order>, u64)> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE owner_id = $1")
      .bind(owner_id)
      .fetch_one(&mut *self.tx)
      .await
      .map_err(store_error)?;
    let offset = i64::try_from(offset).map_err(|_| StoreError::CheckViolation(format!("offset {} is out of range", offset)))?;
    let sql = format!(
      "SELECT {} FROM orders WHERE owner_id = $1 ORDER BY created_at DESC, id LIMIT $2 OFFSET $3",
      ORDER_COLUMNS
    );
    let rows = sqlx::query_as::<_, OrderRow>(&sql)
      .bind(owner_id)
      .bind(i64::from(limit))
      .bind(offset)
      .fetch_all(&mut *self.tx)
      .await
      .map_err(store_error)?;
    let total = u64::try_from(total).map_err(|_| StoreError::Corrupt(format!("negative order count {}", total)))?;
    Ok((convert_all(rows)?, total))
  }

  async fn set_order_status(&mut self, order_id: Uuid, status: OrderStatus) -> StoreResult<()> {
    sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
      .bind(order_id)
      .bind(status.as_str())
      .execute(&mut *self.tx)
      .await
      .map_err(store_error)?;
    Ok(())
  }

  async fn insert_tickets(&mut self, tickets: &[Ticket]) -> StoreResult<()> {
    if tickets.is_empty() {
      return Ok(());
    }
    let mut builder = QueryBuilder::<Postgres>::new(format!("INSERT INTO tickets ({}) ", TICKET_COLUMNS));
    builder.push_values(tickets, |mut row, ticket| {
      row
        .push_bind(ticket.id)
        .push_bind(ticket.order_item_ref)
        .push_bind(ticket.owner_id)
        .push_bind(ticket.event_ref)
        .push_bind(ticket.code.clone())
        .push_bind(ticket.status.as_str())
        .push_bind(ticket.signed_payload.clone())
        .push_bind(ticket.holder_name.clone())
        .push_bind(ticket.check_in_at)
        .push_bind(ticket.issued_at);
    });
    builder.build().execute(&mut *self.tx).await.map_err(store_error)?;
    Ok(())
  }

  async fn find_ticket(&mut self, ticket_id: Uuid) -> StoreResult<Option<Ticket>> {
    let sql = format!("SELECT {} FROM tickets WHERE id = $1", TICKET_COLUMNS);
    let row = sqlx::query_as::<_, TicketRow>(&sql)
      .bind(ticket_id)
      .fetch_optional(&mut *self.tx)
      .await
      .map_err(store_error)?;
    row.map(Ticket::try_from).transpose()
  }

  async fn lock_ticket_by_code(&mut self, code: &str) -> StoreResult<Option<Ticket>> {
    let sql = format!("SELECT {} FROM tickets WHERE code = $1 FOR UPDATE", TICKET_COLUMNS);
    let row = sqlx::query_as::<_, TicketRow>(&sql)
      .bind(code)
      .fetch_optional(&mut *self.tx)
      .await
      .map_err(store_error)?;
    row.map(Ticket::try_from).transpose()
  }

  async fn lock_tickets_for_order(&mut self, order_id: Uuid) -> StoreResult<Vec<Ticket>> {
    let sql = format!(
      "SELECT {} FROM tickets WHERE order_item_ref IN (SELECT id FROM order_items WHERE order_id = $1) \
       ORDER BY code FOR UPDATE",
      TICKET_COLUMNS
    );
    let rows = sqlx::query_as::<_, TicketRow>(&sql)
      .bind(order_id)
      .fetch_all(&mut *self.tx)
      .await
      .map_err(store_error)?;
    convert_all(rows)
  }

  async fn set_ticket_status(
    &mut self,
    ticket_id: Uuid,
    status: TicketStatus,
    check_in_at: Option<DateTime<Utc>>,
  ) -> StoreResult<()> {
    sqlx::query("UPDATE tickets SET status = $2, check_in_at = $3 WHERE id = $1")
      .bind(ticket_id)
      .bind(status.as_str())
      .bind(check_in_at)
      .execute(&mut *self.tx)
      .await
      .map_err(store_error)?;
    Ok(())
  }

  async fn list_tickets(&mut self, owner_id: Uuid, filter: TicketFilter) -> StoreResult<Vec<Ticket>> {
    let sql = format!(
      "SELECT {} FROM tickets WHERE owner_id = $1 \
       AND ($2::UUID IS NULL OR event_ref = $2) AND ($3::TEXT IS NULL OR status = $3) \
       ORDER BY issued_at DESC, code",
      TICKET_COLUMNS
    );
    let rows = sqlx::query_as::<_, TicketRow>(&sql)
      .bind(owner_id)
      .bind(filter.event_ref)
      .bind(filter.status.map(|s| s.as_str()))
      .fetch_all(&mut *self.tx)
      .await
      .map_err(store_error)?;
    convert_all(rows)
  }

  async fn commit(self: Box<Self>) -> StoreResult<()> {
    self.tx.commit().await.map_err(store_error)
  }

  async fn rollback(self: Box<Self>) -> StoreResult<()> {
    self.tx.rollback().await.map_err(store_error)
  }
}
