// core/src/fulfillment/orders.rs

use super::FulfillmentService;
use crate::error::{Result, TicketingError};
use crate::live::push_stock_level;
use crate::models::{Order, OrderDetail, OrderStatus, Page, TicketStatus};
use crate::ports::DomainEvent;
use crate::transaction::within_deadline;
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub const MAX_PAGE_SIZE: u32 = 100;

impl FulfillmentService {
  /// The owner's orders, newest first. `page` is 1-based.
  #[instrument(name = "orders_for_owner", skip(self))]
  pub async fn orders_for_owner(&self, owner_id: Uuid, page: u32, page_size: u32) -> Result<Page<Order>> {
    if page == 0 || page_size == 0 || page_size > MAX_PAGE_SIZE {
      return Err(TicketingError::BadRequest(format!(
        "page must be >= 1 and page_size within 1..={}",
        MAX_PAGE_SIZE
      )));
    }
    let offset = u64::from(page - 1) * u64::from(page_size);
    let (orders, total) = within_deadline(self.deps.settings.transaction_timeout, "orders_for_owner", async {
      let mut tx = self.deps.store.begin().await?;
      let listed = tx.list_orders(owner_id, offset, page_size).await?;
      tx.rollback().await?;
      Ok(listed)
    })
    .await?;
    Ok(Page::new(orders, page, page_size, total))
  }

  /// One of the owner's orders with its lines. Other owners' orders read as absent.
  #[instrument(name = "order_for_owner", skip(self))]
  pub async fn order_for_owner(&self, owner_id: Uuid, order_id: Uuid) -> Result<OrderDetail> {
    within_deadline(self.deps.settings.transaction_timeout, "order_for_owner", async {
      let mut tx = self.deps.store.begin().await?;
      let order = tx
        .find_order(order_id)
        .await?
        .filter(|o| o.owner_id == owner_id)
        .ok_or_else(|| order_not_found(order_id))?;
      let items = tx.order_items(order_id).await?;
      tx.rollback().await?;
      Ok(OrderDetail { order, items })
    })
    .await
  }

  /// Refunds a completed order whose tickets have not been used.
  ///
  /// Cancels every ticket and hands the quantities back to the ledger in one
  /// transaction. The money reversal is left to whoever consumes `order.refunded`.
  #[instrument(name = "refund_order", skip(self))]
  pub async fn refund_order(&self, owner_id: Uuid, order_id: Uuid) -> Result<Order> {
    let now = self.deps.clock.now();
    let (order, cancelled, restocked) = within_deadline(self.deps.settings.transaction_timeout, "refund_order", async {
      let mut tx = self.deps.store.begin().await?;
      let mut order = tx
        .lock_order(order_id)
        .await?
        .filter(|o| o.owner_id == owner_id)
        .ok_or_else(|| order_not_found(order_id))?;

      if !order.status.can_transition_to(OrderStatus::Refunded) {
        return Err(TicketingError::Conflict(format!(
          "Order {} is {} and cannot be refunded.",
          order.public_code, order.status
        )));
      }

      let tickets = tx.lock_tickets_for_order(order_id).await?;
      if let Some(used) = tickets.iter().find(|t| t.status == TicketStatus::Used) {
        return Err(TicketingError::Conflict(format!(
          "Ticket {} was already used; order {} cannot be refunded.",
          used.code, order.public_code
        )));
      }

      let items = tx.order_items(order_id).await?;
      let mut ids: Vec<Uuid> = items.iter().map(|i| i.stock_unit_ref).collect();
      ids.sort();
      ids.dedup();
      let mut restocked = tx.lock_stock_units(&ids).await?;
      for item in &items {
        tx.adjust_sold(item.stock_unit_ref, -i64::from(item.quantity)).await?;
        if let Some(unit) = restocked.iter_mut().find(|u| u.id == item.stock_unit_ref) {
          unit.sold_count = unit.sold_count.saturating_sub(item.quantity);
        }
      }

      let mut cancelled = 0;
      for ticket in tickets.iter().filter(|t| t.status == TicketStatus::Valid) {
        tx.set_ticket_status(ticket.id, TicketStatus::Cancelled, None).await?;
        cancelled += 1;
      }
      tx.set_order_status(order_id, OrderStatus::Refunded).await?;

      let mut levels = Vec::with_capacity(restocked.len());
      for unit in restocked {
        let reserved = tx.reserved_quantity(unit.id, now).await?;
        let available = unit.available_after_holds(reserved);
        levels.push((unit, available));
      }
      tx.commit().await?;

      order.status = OrderStatus::Refunded;
      Ok((order, cancelled, levels))
    })
    .await?;

    info!(order = %order.public_code, cancelled, "Order refunded.");

    let event = DomainEvent::OrderRefunded {
      order_id: order.id,
      public_code: order.public_code.clone(),
      owner_id: order.owner_id,
      payment_ref: order.payment_ref.clone(),
      amount: order.total.clone(),
      cancelled_tickets: cancelled,
    };
    if let Err(e) = self.deps.publisher.publish(event).await {
      warn!(order = %order.public_code, error = %e, "order.refunded was not published.");
    }
    for (unit, available) in &restocked {
      push_stock_level(self.deps.notifier.as_ref(), self.deps.settings.low_stock_threshold, unit, *available);
    }
    Ok(order)
  }
}

fn order_not_found(order_id: Uuid) -> TicketingError {
  TicketingError::NotFound(format!("Order {} does not exist.", order_id))
}
