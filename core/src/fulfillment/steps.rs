// core/src/fulfillment/steps.rs

//! Handlers of the checkout pipeline.
//!
//! Context guards are taken and dropped between awaits; nothing below holds
//! a `ContextData` lock across a store or gateway call.

use super::context::CheckoutState;
use super::FulfillmentDeps;
use crate::error::{Result, TicketingError};
use crate::issuance::mint_tickets;
use crate::live::{push, push_stock_level};
use crate::models::{CartItem, Money, Order, OrderItem, OrderStatus, StockUnit, Ticket};
use crate::ports::{DomainEvent, LiveUpdate, PurchasedLine};
use crate::transaction::within_deadline;
use crate::workflow::{ContextData, PipelineControl};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

type Ctx = ContextData<CheckoutState>;

pub(super) async fn load_cart(deps: Arc<FulfillmentDeps>, ctx: Ctx) -> Result<PipelineControl> {
  let owner_id = ctx.read().owner_id;
  let now = deps.clock.now();

  let (cart, lines, units) = within_deadline(deps.settings.transaction_timeout, "load_cart", async {
    let mut tx = deps.store.begin().await?;
    let Some(cart) = tx.find_cart(owner_id).await? else {
      return Err(TicketingError::BadRequest("There is no cart to check out.".to_string()));
    };
    let lines = tx.cart_items(cart.id).await?;
    let mut units = HashMap::new();
    for line in &lines {
      if let Some(unit) = tx.find_stock_unit(line.stock_unit_ref).await? {
        units.insert(unit.id, unit);
      }
    }
    tx.rollback().await?;
    Ok((cart, lines, units))
  })
  .await?;

  if !cart.is_active(now) {
    return Err(TicketingError::BadRequest(
      "The cart has expired; its tickets are no longer held.".to_string(),
    ));
  }
  if lines.is_empty() {
    return Err(TicketingError::BadRequest("The cart is empty.".to_string()));
  }
  let currencies: BTreeSet<&str> = lines.iter().map(|l| l.price_snapshot.currency.as_str()).collect();
  if currencies.len() > 1 {
    return Err(TicketingError::BadRequest(
      "The cart mixes currencies and cannot be charged at once.".to_string(),
    ));
  }
  for line in &lines {
    let unit = units.get(&line.stock_unit_ref).ok_or_else(|| {
      TicketingError::Conflict(format!("Ticket type {} is no longer sold.", line.stock_unit_ref))
    })?;
    if line.quantity < unit.min_per_order {
      return Err(TicketingError::BadRequest(format!(
        "At least {} tickets of type '{}' per purchase.",
        unit.min_per_order, unit.name
      )));
    }
  }

  debug!(cart = %cart.id, lines = lines.len(), "Cart loaded for checkout.");
  let mut state = ctx.write();
  state.cart = Some(cart);
  state.lines = lines;
  state.units = units;
  Ok(PipelineControl::Continue)
}

/// Fast, unleased pre-payment check against the current ledger.
pub(super) async fn verify_stock(deps: Arc<FulfillmentDeps>, ctx: Ctx) -> Result<PipelineControl> {
  let wanted: Vec<Uuid> = ctx.map_read(|s| s.lines.as_slice()).iter().map(|l| l.stock_unit_ref).collect();

  let fresh = within_deadline(deps.settings.transaction_timeout, "verify_stock", async {
    let mut tx = deps.store.begin().await?;
    let mut fresh = HashMap::new();
    for id in wanted {
      if let Some(unit) = tx.find_stock_unit(id).await? {
        fresh.insert(id, unit);
      }
    }
    tx.rollback().await?;
    Ok(fresh)
  })
  .await?;

  check_sellable(&ctx.read().lines, &fresh)?;
  ctx.write().units = fresh;
  Ok(PipelineControl::Continue)
}

pub(super) async fn price_order(ctx: Ctx) -> Result<PipelineControl> {
  let total = {
    let state = ctx.read();
    order_total(&state.lines)?
  };
  debug!(total = %total, "Order priced.");
  ctx.write().total = Some(total);
  Ok(PipelineControl::Continue)
}

pub(super) async fn capture_payment(deps: Arc<FulfillmentDeps>, ctx: Ctx) -> Result<PipelineControl> {
  let (method_ref, total) = {
    let state = ctx.read();
    let total = state
      .total
      .clone()
      .ok_or_else(|| TicketingError::BadRequest("Order has not been priced.".to_string()))?;
    (state.payment.method_ref.clone(), total)
  };

  let outcome = deps
    .payments
    .process_payment(&method_ref, &total)
    .await
    .map_err(|e| TicketingError::Unavailable(e.to_string()))?;

  info!(approved = outcome.success, reference = ?outcome.reference, "Payment gateway answered.");
  ctx.write().payment_outcome = Some(outcome);
  Ok(PipelineControl::Continue)
}

pub(super) async fn push_payment_status(deps: Arc<FulfillmentDeps>, ctx: Ctx) -> Result<PipelineControl> {
  let update = {
    let state = ctx.read();
    state.payment_outcome.as_ref().map(|o| LiveUpdate::PaymentStatus {
      owner_id: state.owner_id,
      approved: o.success,
      message: o.message.clone(),
    })
  };
  if let Some(update) = update {
    push(deps.notifier.as_ref(), update);
  }
  Ok(PipelineControl::Continue)
}

/// A declined charge ends checkout here, before anything is written.
pub(super) async fn require_approval(ctx: Ctx) -> Result<PipelineControl> {
  let state = ctx.read();
  match &state.payment_outcome {
    Some(outcome) if outcome.success => Ok(PipelineControl::Continue),
    Some(outcome) => Err(TicketingError::PaymentDeclined(outcome.message.clone())),
    None => Err(TicketingError::PaymentDeclined("No payment outcome recorded.".to_string())),
  }
}

struct Committed {
  order: Order,
  items: Vec<OrderItem>,
  tickets: Vec<Ticket>,
  stock_after: Vec<(StockUnit, u32)>,
}

/// The single ledger-writing transaction of checkout.
pub(super) async fn commit_order(deps: Arc<FulfillmentDeps>, ctx: Ctx) -> Result<PipelineControl> {
  let state = ctx.read().clone();
  let payment_ref = state.payment_ref().map(str::to_string);
  let now = deps.clock.now();

  let result = within_deadline(deps.settings.transaction_timeout, "commit_order", async {
    let total = state
      .total
      .clone()
      .ok_or_else(|| TicketingError::BadRequest("Order has not been priced.".to_string()))?;
    let mut tx = deps.store.begin().await?;

    let cart = tx
      .lock_cart(state.owner_id)
      .await?
      .ok_or_else(|| TicketingError::Conflict("The cart disappeared during checkout.".to_string()))?;
    let current = tx.cart_items(cart.id).await?;
    if line_key(&current) != line_key(&state.lines) {
      return Err(TicketingError::Conflict(
        "The cart changed while the payment was processed.".to_string(),
      ));
    }

    let mut ids: Vec<Uuid> = state.lines.iter().map(|l| l.stock_unit_ref).collect();
    ids.sort();
    ids.dedup();
    let leased: HashMap<Uuid, StockUnit> = tx
      .lock_stock_units(&ids)
      .await?
      .into_iter()
      .map(|u| (u.id, u))
      .collect();
    check_sellable(&state.lines, &leased)?;

    let order = Order {
      id: Uuid::new_v4(),
      public_code: Order::generate_public_code(),
      owner_id: state.owner_id,
      total,
      status: OrderStatus::Completed,
      payment_ref: payment_ref.clone(),
      billing_address: state.payment.billing_address.clone(),
      created_at: now,
    };
    tx.insert_order(&order).await?;

    let items: Vec<OrderItem> = state
      .lines
      .iter()
      .map(|line| OrderItem {
        id: Uuid::new_v4(),
        order_id: order.id,
        stock_unit_ref: line.stock_unit_ref,
        quantity: line.quantity,
        price_at_purchase: line.price_snapshot.clone(),
      })
      .collect();
    tx.insert_order_items(&items).await?;

    let holder = order.billing_address.full_name.as_str();
    let mut tickets = Vec::new();
    let mut stock_after = Vec::with_capacity(items.len());
    for item in &items {
      tx.adjust_sold(item.stock_unit_ref, i64::from(item.quantity)).await?;
      if let Some(unit) = leased.get(&item.stock_unit_ref) {
        let mut after = unit.clone();
        after.sold_count += item.quantity;
        tickets.extend(
          mint_tickets(&order, item, unit.event_ref, holder, &deps.signer)
            .into_iter()
            .map(|draft| draft.into_ticket(Uuid::new_v4(), now)),
        );
        stock_after.push(after);
      }
    }
    tx.insert_tickets(&tickets).await?;
    tx.clear_cart_items(cart.id).await?;

    // Other owners' holds still count against what a buyer can take next.
    let mut with_available = Vec::with_capacity(stock_after.len());
    for unit in stock_after {
      let reserved = tx.reserved_quantity(unit.id, now).await?;
      let available = unit.available_after_holds(reserved);
      with_available.push((unit, available));
    }
    tx.commit().await?;

    Ok(Committed {
      order,
      items,
      tickets,
      stock_after: with_available,
    })
  })
  .await;

  let committed = match result {
    Ok(committed) => committed,
    Err(e) => {
      error!(
        owner = %state.owner_id,
        payment_ref = ?payment_ref,
        error = %e,
        "Payment captured but the order was not recorded; reconcile this charge."
      );
      return Err(e);
    }
  };

  info!(
    order = %committed.order.public_code,
    tickets = committed.tickets.len(),
    "Order committed."
  );
  let mut state = ctx.write();
  state.order = Some(committed.order);
  state.order_items = committed.items;
  state.tickets = committed.tickets;
  state.stock_after = committed.stock_after;
  Ok(PipelineControl::Continue)
}

pub(super) async fn announce_purchase(deps: Arc<FulfillmentDeps>, ctx: Ctx) -> Result<PipelineControl> {
  let event = {
    let state = ctx.read();
    let Some(order) = state.order.as_ref() else {
      return Ok(PipelineControl::Continue);
    };
    DomainEvent::PurchaseCompleted {
      order_id: order.id,
      public_code: order.public_code.clone(),
      owner_id: order.owner_id,
      buyer_email: order.billing_address.email.clone(),
      buyer_name: order.billing_address.full_name.clone(),
      total: order.total.clone(),
      lines: state.order_items.iter().map(PurchasedLine::from).collect(),
      ticket_count: state.tickets.len(),
    }
  };

  deps
    .publisher
    .publish(event)
    .await
    .map_err(|e| TicketingError::Unavailable(e.to_string()))?;
  debug!("purchase.completed published.");
  Ok(PipelineControl::Continue)
}

pub(super) async fn push_updates(deps: Arc<FulfillmentDeps>, ctx: Ctx) -> Result<PipelineControl> {
  let state = ctx.read().clone();
  for (unit, available) in &state.stock_after {
    push_stock_level(deps.notifier.as_ref(), deps.settings.low_stock_threshold, unit, *available);
  }
  if let Some(order) = &state.order {
    push(
      deps.notifier.as_ref(),
      LiveUpdate::TicketsIssued {
        owner_id: order.owner_id,
        order_id: order.id,
        count: state.tickets.len(),
      },
    );
  }
  Ok(PipelineControl::Continue)
}

/// Every line fits in `total − sold` of its ticket type.
fn check_sellable(lines: &[CartItem], units: &HashMap<Uuid, StockUnit>) -> Result<()> {
  for line in lines {
    let unit = units.get(&line.stock_unit_ref).ok_or_else(|| {
      TicketingError::Conflict(format!("Ticket type {} is no longer sold.", line.stock_unit_ref))
    })?;
    if !unit.can_sell(line.quantity) {
      return Err(TicketingError::Conflict(format!(
        "Not enough tickets of type '{}' left: {} requested, {} remaining.",
        unit.name,
        line.quantity,
        unit.remaining()
      )));
    }
  }
  Ok(())
}

fn order_total(lines: &[CartItem]) -> Result<Money> {
  let overflow = || TicketingError::BadRequest("Order total overflows.".to_string());
  let mut lines = lines.iter();
  let first = lines
    .next()
    .ok_or_else(|| TicketingError::BadRequest("The cart is empty.".to_string()))?;
  let mut total = first.subtotal().ok_or_else(overflow)?;
  for line in lines {
    let subtotal = line.subtotal().ok_or_else(overflow)?;
    total = total.checked_add(&subtotal).ok_or_else(overflow)?;
  }
  Ok(total)
}

fn line_key(lines: &[CartItem]) -> Vec<(Uuid, u32, Money)> {
  let mut key: Vec<(Uuid, u32, Money)> = lines
    .iter()
    .map(|l| (l.stock_unit_ref, l.quantity, l.price_snapshot.clone()))
    .collect();
  key.sort_by_key(|(id, _, _)| *id);
  key
}
