// core/src/adapters/memory_store.rs

//! A [`TicketingStore`] kept in process memory.
//!
//! A transaction leases the whole store and works on a private copy of it.
//! Commit swaps the copy in; dropping the transaction throws it away. Leasing
//! everything is coarser than row locks but gives the same serial outcome for
//! any pair of conflicting transactions.

use crate::error::{StoreError, StoreResult};
use crate::models::{Cart, CartItem, Order, OrderItem, OrderStatus, StockUnit, Ticket, TicketFilter, TicketStatus};
use crate::ports::{StoreTx, TicketingStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
struct MemoryState {
  stock_units: BTreeMap<Uuid, StockUnit>,
  carts: HashMap<Uuid, Cart>,
  cart_items: HashMap<Uuid, CartItem>,
  orders: HashMap<Uuid, Order>,
  order_items: HashMap<Uuid, OrderItem>,
  tickets: HashMap<Uuid, Ticket>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl TicketingStore for MemoryStore {
  async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
    let guard = self.state.clone().lock_owned().await;
    let working = guard.clone();
    Ok(Box::new(MemoryTx { guard, working }))
  }
}

struct MemoryTx {
  guard: OwnedMutexGuard<MemoryState>,
  working: MemoryState,
}

impl MemoryTx {
  fn stock_unit_mut(&mut self, id: Uuid) -> StoreResult<&mut StockUnit> {
    self
      .working
      .stock_units
      .get_mut(&id)
      .ok_or_else(|| StoreError::Corrupt(format!("stock unit {} vanished inside the transaction", id)))
  }

  fn tickets_of_items(&self, item_ids: &HashSet<Uuid>) -> Vec<Ticket> {
    let mut tickets: Vec<Ticket> = self
      .working
      .tickets
      .values()
      .filter(|t| item_ids.contains(&t.order_item_ref))
      .cloned()
      .collect();
    tickets.sort_by(|a, b| a.code.cmp(&b.code));
    tickets
  }
}

#[async_trait]
impl StoreTx for MemoryTx {
  async fn find_stock_unit(&mut self, id: Uuid) -> StoreResult<Option<StockUnit>> {
    Ok(self.working.stock_units.get(&id).cloned())
  }

  async fn lock_stock_units(&mut self, ids: &[Uuid]) -> StoreResult<Vec<StockUnit>> {
    let wanted: HashSet<&Uuid> = ids.iter().collect();
    // BTreeMap iteration is already ascending by id.
    Ok(
      self
        .working
        .stock_units
        .values()
        .filter(|u| wanted.contains(&u.id))
        .cloned()
        .collect(),
    )
  }

  async fn list_stock_units(&mut self, event_ref: Uuid) -> StoreResult<Vec<StockUnit>> {
    let mut units: Vec<StockUnit> = self
      .working
      .stock_units
      .values()
      .filter(|u| u.event_ref == event_ref)
      .cloned()
      .collect();
    units.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(units)
  }

  async fn insert_stock_unit(&mut self, unit: &StockUnit) -> StoreResult<()> {
    if self.working.stock_units.contains_key(&unit.id) {
      return Err(StoreError::UniqueViolation(format!("stock_units.id {}", unit.id)));
    }
    self.working.stock_units.insert(unit.id, unit.clone());
    Ok(())
  }

  async fn update_stock_unit(&mut self, unit: &StockUnit) -> StoreResult<()> {
    if unit.sold_count > unit.total_quantity {
      return Err(StoreError::CheckViolation(format!(
        "stock unit {} would have sold_count {} > total_quantity {}",
        unit.id, unit.sold_count, unit.total_quantity
      )));
    }
    if let Some(existing) = self.working.stock_units.get_mut(&unit.id) {
      *existing = unit.clone();
    }
    Ok(())
  }

  async fn delete_stock_unit(&mut self, id: Uuid) -> StoreResult<bool> {
    self.working.cart_items.retain(|_, i| i.stock_unit_ref != id);
    Ok(self.working.stock_units.remove(&id).is_some())
  }

  async fn adjust_sold(&mut self, id: Uuid, delta: i64) -> StoreResult<()> {
    let unit = self.stock_unit_mut(id)?;
    let next = i64::from(unit.sold_count) + delta;
    if next < 0 || next > i64::from(unit.total_quantity) {
      return Err(StoreError::CheckViolation(format!(
        "stock unit {} sold_count would become {} (total {})",
        id, next, unit.total_quantity
      )));
    }
    unit.sold_count = next as u32;
    Ok(())
  }

  async fn find_cart(&mut self, owner_id: Uuid) -> StoreResult<Option<Cart>> {
    Ok(self.working.carts.values().find(|c| c.owner_id == owner_id).cloned())
  }

  async fn lock_cart(&mut self, owner_id: Uuid) -> StoreResult<Option<Cart>> {
    self.find_cart(owner_id).await
  }

  async fn insert_cart_if_absent(&mut self, cart: &Cart) -> StoreResult<Cart> {
    if let Some(existing) = self.working.carts.values().find(|c| c.owner_id == cart.owner_id) {
      return Ok(existing.clone());
    }
    if self.working.carts.contains_key(&cart.id) {
      return Err(StoreError::UniqueViolation(format!("carts.id {}", cart.id)));
    }
    self.working.carts.insert(cart.id, cart.clone());
    Ok(cart.clone())
  }

  async fn set_cart_expiry(&mut self, cart_id: Uuid, expires_at: DateTime<Utc>) -> StoreResult<()> {
    if let Some(cart) = self.working.carts.get_mut(&cart_id) {
      cart.expires_at = expires_at;
    }
    Ok(())
  }

  async fn cart_items(&mut self, cart_id: Uuid) -> StoreResult<Vec<CartItem>> {
    let mut items: Vec<CartItem> = self
      .working
      .cart_items
      .values()
      .filter(|i| i.cart_id == cart_id)
      .cloned()
      .collect();
    items.sort_by_key(|i| i.stock_unit_ref);
    Ok(items)
  }

  async fn reserved_quantity(&mut self, stock_unit_ref: Uuid, now: DateTime<Utc>) -> StoreResult<u32> {
    let carts = &self.working.carts;
    Ok(
      self
        .working
        .cart_items
        .values()
        .filter(|i| i.stock_unit_ref == stock_unit_ref)
        .filter(|i| carts.get(&i.cart_id).is_some_and(|c| c.is_active(now)))
        .map(|i| i.quantity)
        .sum(),
    )
  }

  async fn insert_cart_item(&mut self, item: &CartItem) -> StoreResult<()> {
    let duplicate = self
      .working
      .cart_items
      .values()
      .any(|i| i.cart_id == item.cart_id && i.stock_unit_ref == item.stock_unit_ref);
    if duplicate {
      return Err(StoreError::UniqueViolation(format!(
        "cart_items (cart {}, stock unit {})",
        item.cart_id, item.stock_unit_ref
      )));
    }
    self.working.cart_items.insert(item.id, item.clone());
    Ok(())
  }

  async fn set_cart_item_quantity(&mut self, item_id: Uuid, quantity: u32) -> StoreResult<()> {
    if let Some(item) = self.working.cart_items.get_mut(&item_id) {
      item.quantity = quantity;
    }
    Ok(())
  }

  async fn delete_cart_item(&mut self, cart_id: Uuid, item_id: Uuid) -> StoreResult<bool> {
    match self.working.cart_items.get(&item_id) {
      Some(item) if item.cart_id == cart_id => {
        self.working.cart_items.remove(&item_id);
        Ok(true)
      }
      _ => Ok(false),
    }
  }

  async fn clear_cart_items(&mut self, cart_id: Uuid) -> StoreResult<u64> {
    let before = self.working.cart_items.len();
    self.working.cart_items.retain(|_, i| i.cart_id != cart_id);
    Ok((before - self.working.cart_items.len()) as u64)
  }

  async fn insert_order(&mut self, order: &Order) -> StoreResult<()> {
    if self.working.orders.values().any(|o| o.public_code == order.public_code) {
      return Err(StoreError::UniqueViolation(format!("orders.public_code {}", order.public_code)));
    }
    self.working.orders.insert(order.id, order.clone());
    Ok(())
  }

  async fn insert_order_items(&mut self, items: &[OrderItem]) -> StoreResult<()> {
    for item in items {
      self.working.order_items.insert(item.id, item.clone());
    }
    Ok(())
  }

  async fn find_order(&mut self, order_id: Uuid) -> StoreResult<Option<Order>> {
    Ok(self.working.orders.get(&order_id).cloned())
  }

  async fn lock_order(&mut self, order_id: Uuid) -> StoreResult<Option<Order>> {
    self.find_order(order_id).await
  }

  async fn order_items(&mut self, order_id: Uuid) -> StoreResult<Vec<OrderItem>> {
    let mut items: Vec<OrderItem> = self
      .working
      .order_items
      .values()
      .filter(|i| i.order_id == order_id)
      .cloned()
      .collect();
    items.sort_by_key(|i| i.stock_unit_ref);
    Ok(items)
  }

  async fn list_orders(&mut self, owner_id: Uuid, offset: u64, limit: u32) -> StoreResult<(Vec<Order>, u64)> {
    let mut orders: Vec<Order> = self
      .working
      .orders
      .values()
      .filter(|o| o.owner_id == owner_id)
      .cloned()
      .collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    let total = orders.len() as u64;
    let page = orders
      .into_iter()
      .skip(offset as usize)
      .take(limit as usize)
      .collect();
    Ok((page, total))
  }

  async fn set_order_status(&mut self, order_id: Uuid, status: OrderStatus) -> StoreResult<()> {
    if let Some(order) = self.working.orders.get_mut(&order_id) {
      order.status = status;
    }
    Ok(())
  }

  async fn insert_tickets(&mut self, tickets: &[Ticket]) -> StoreResult<()> {
    let mut codes: HashSet<&str> = self.working.tickets.values().map(|t| t.code.as_str()).collect();
    for ticket in tickets {
      if !codes.insert(ticket.code.as_str()) {
        return Err(StoreError::UniqueViolation(format!("tickets.code {}", ticket.code)));
      }
    }
    for ticket in tickets {
      self.working.tickets.insert(ticket.id, ticket.clone());
    }
    Ok(())
  }

  async fn find_ticket(&mut self, ticket_id: Uuid) -> StoreResult<Option<Ticket>> {
    Ok(self.working.tickets.get(&ticket_id).cloned())
  }

  async fn lock_ticket_by_code(&mut self, code: &str) -> StoreResult<Option<Ticket>> {
    Ok(self.working.tickets.values().find(|t| t.code == code).cloned())
  }

  async fn lock_tickets_for_order(&mut self, order_id: Uuid) -> StoreResult<Vec<Ticket>> {
    let item_ids: HashSet<Uuid> = self
      .working
      .order_items
      .values()
      .filter(|i| i.order_id == order_id)
      .map(|i| i.id)
      .collect();
    Ok(self.tickets_of_items(&item_ids))
  }

  async fn set_ticket_status(
    &mut self,
    ticket_id: Uuid,
    status: TicketStatus,
    check_in_at: Option<DateTime<Utc>>,
  ) -> StoreResult<()> {
    if let Some(ticket) = self.working.tickets.get_mut(&ticket_id) {
      ticket.status = status;
      ticket.check_in_at = check_in_at;
    }
    Ok(())
  }

  async fn list_tickets(&mut self, owner_id: Uuid, filter: TicketFilter) -> StoreResult<Vec<Ticket>> {
    let mut tickets: Vec<Ticket> = self
      .working
      .tickets
      .values()
      .filter(|t| t.owner_id == owner_id && filter.matches(t))
      .cloned()
      .collect();
    tickets.sort_by(|a, b| b.issued_at.cmp(&a.issued_at).then_with(|| a.code.cmp(&b.code)));
    Ok(tickets)
  }

  async fn commit(self: Box<Self>) -> StoreResult<()> {
    let MemoryTx { mut guard, working } = *self;
    *guard = working;
    Ok(())
  }

  async fn rollback(self: Box<Self>) -> StoreResult<()> {
    Ok(())
  }
}
