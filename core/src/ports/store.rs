// core/src/ports/store.rs

//! Transactional store port.
//!
//! A [`StoreTx`] is one store transaction. Writes become visible to other
//! transactions only on [`StoreTx::commit`]; dropping a transaction without
//! committing discards its writes. `lock_*` methods lease the returned rows
//! until the transaction ends, so two transactions leasing the same row run
//! one after the other.

use crate::error::StoreResult;
use crate::models::{Cart, CartItem, Order, OrderItem, OrderStatus, StockUnit, Ticket, TicketFilter, TicketStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait]
pub trait TicketingStore: Send + Sync {
  async fn begin(&self) -> StoreResult<Box<dyn StoreTx>>;
}

#[async_trait]
pub trait StoreTx: Send {
  // --- stock units ---
  async fn find_stock_unit(&mut self, id: Uuid) -> StoreResult<Option<StockUnit>>;

  /// Leases the given stock rows in ascending id order. Unknown ids are skipped.
  async fn lock_stock_units(&mut self, ids: &[Uuid]) -> StoreResult<Vec<StockUnit>>;

  async fn list_stock_units(&mut self, event_ref: Uuid) -> StoreResult<Vec<StockUnit>>;
  async fn insert_stock_unit(&mut self, unit: &StockUnit) -> StoreResult<()>;
  async fn update_stock_unit(&mut self, unit: &StockUnit) -> StoreResult<()>;
  /// Also drops any cart lines still pointing at the unit.
  async fn delete_stock_unit(&mut self, id: Uuid) -> StoreResult<bool>;

  /// Adds `delta` (which may be negative) to `sold_count`.
  async fn adjust_sold(&mut self, id: Uuid, delta: i64) -> StoreResult<()>;

  // --- carts ---
  async fn find_cart(&mut self, owner_id: Uuid) -> StoreResult<Option<Cart>>;
  async fn lock_cart(&mut self, owner_id: Uuid) -> StoreResult<Option<Cart>>;

  /// Inserts `cart` unless the owner already has one; returns the owner's leased cart either way.
  async fn insert_cart_if_absent(&mut self, cart: &Cart) -> StoreResult<Cart>;
  async fn set_cart_expiry(&mut self, cart_id: Uuid, expires_at: DateTime<Utc>) -> StoreResult<()>;
  async fn cart_items(&mut self, cart_id: Uuid) -> StoreResult<Vec<CartItem>>;

  /// Sum of held quantities for a stock unit across carts still active at `now`.
  async fn reserved_quantity(&mut self, stock_unit_ref: Uuid, now: DateTime<Utc>) -> StoreResult<u32>;

  async fn insert_cart_item(&mut self, item: &CartItem) -> StoreResult<()>;
  async fn set_cart_item_quantity(&mut self, item_id: Uuid, quantity: u32) -> StoreResult<()>;

  /// Returns `false` when the item is not in that cart.
  async fn delete_cart_item(&mut self, cart_id: Uuid, item_id: Uuid) -> StoreResult<bool>;
  async fn clear_cart_items(&mut self, cart_id: Uuid) -> StoreResult<u64>;

  // --- orders ---
  async fn insert_order(&mut self, order: &Order) -> StoreResult<()>;
  async fn insert_order_items(&mut self, items: &[OrderItem]) -> StoreResult<()>;
  async fn find_order(&mut self, order_id: Uuid) -> StoreResult<Option<Order>>;
  async fn lock_order(&mut self, order_id: Uuid) -> StoreResult<Option<Order>>;
  async fn order_items(&mut self, order_id: Uuid) -> StoreResult<Vec<OrderItem>>;

  /// Newest first. Returns the page and the owner's total order count.
  async fn list_orders(&mut self, owner_id: Uuid, offset: u64, limit: u32) -> StoreResult<(Vec<Order>, u64)>;
  async fn set_order_status(&mut self, order_id: Uuid, status: OrderStatus) -> StoreResult<()>;

  // --- tickets ---
  async fn insert_tickets(&mut self, tickets: &[Ticket]) -> StoreResult<()>;
  async fn find_ticket(&mut self, ticket_id: Uuid) -> StoreResult<Option<Ticket>>;
  async fn lock_ticket_by_code(&mut self, code: &str) -> StoreResult<Option<Ticket>>;

  /// Leases every ticket issued for the order's items.
  async fn lock_tickets_for_order(&mut self, order_id: Uuid) -> StoreResult<Vec<Ticket>>;
  async fn set_ticket_status(
    &mut self,
    ticket_id: Uuid,
    status: TicketStatus,
    check_in_at: Option<DateTime<Utc>>,
  ) -> StoreResult<()>;

  /// Newest first.
  async fn list_tickets(&mut self, owner_id: Uuid, filter: TicketFilter) -> StoreResult<Vec<Ticket>>;

  async fn commit(self: Box<Self>) -> StoreResult<()>;
  async fn rollback(self: Box<Self>) -> StoreResult<()>;
}
