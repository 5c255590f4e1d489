// core/src/reservation.rs

//! Per-owner carts whose items hold stock for a limited time.
//!
//! Expiry is lazy: an expired cart keeps its rows but stops counting towards
//! reserved stock, and is emptied and renewed the next time its owner touches
//! it.

use crate::clock::Clock;
use crate::error::{Result, TicketingError};
use crate::live::{push, push_stock_level};
use crate::models::{Cart, CartItem, CartLine, CartView, StockUnit};
use crate::ports::{LiveNotifier, LiveUpdate, StoreTx, TicketingStore};
use crate::settings::CoreSettings;
use crate::transaction::within_deadline;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

pub struct ReservationManager {
  store: Arc<dyn TicketingStore>,
  clock: Arc<dyn Clock>,
  notifier: Arc<dyn LiveNotifier>,
  settings: CoreSettings,
}

impl ReservationManager {
  pub fn new(
    store: Arc<dyn TicketingStore>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn LiveNotifier>,
    settings: CoreSettings,
  ) -> Self {
    Self {
      store,
      clock,
      notifier,
      settings,
    }
  }

  /// Returns the owner's active cart, creating it or renewing an expired one.
  #[instrument(name = "get_or_create_cart", skip(self))]
  pub async fn get_or_create_cart(&self, owner_id: Uuid) -> Result<Cart> {
    let now = self.clock.now();
    within_deadline(self.settings.transaction_timeout, "get_or_create_cart", async {
      let mut tx = self.store.begin().await?;
      let (cart, expired) = resolve_cart(tx.as_mut(), owner_id, now, &self.settings).await?;
      tx.commit().await?;
      Ok((cart, expired))
    })
    .await
    .map(|(cart, expired)| {
      self.announce_expiry(expired);
      cart
    })
  }

  /// Holds `quantity` more units of a ticket type in the owner's cart.
  ///
  /// The ticket type row stays leased from the availability check until the
  /// line is written, so two holds on the same type never both see the same
  /// free units.
  #[instrument(name = "add_hold", skip(self))]
  pub async fn add_hold(&self, owner_id: Uuid, stock_unit_ref: Uuid, quantity: u32) -> Result<CartItem> {
    if quantity == 0 {
      return Err(TicketingError::BadRequest("Quantity must be at least 1.".to_string()));
    }
    let now = self.clock.now();

    let (item, unit, available, expired) = within_deadline(self.settings.transaction_timeout, "add_hold", async {
      let mut tx = self.store.begin().await?;
      let (cart, expired) = resolve_cart(tx.as_mut(), owner_id, now, &self.settings).await?;

      let unit = tx
        .lock_stock_units(&[stock_unit_ref])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| TicketingError::NotFound(format!("Ticket type {} does not exist.", stock_unit_ref)))?;

      if !unit.is_on_sale(now) {
        return Err(TicketingError::BadRequest(format!(
          "Ticket type '{}' is not on sale right now.",
          unit.name
        )));
      }
      if quantity > unit.max_per_order {
        return Err(TicketingError::BadRequest(format!(
          "At most {} tickets of type '{}' per purchase.",
          unit.max_per_order, unit.name
        )));
      }

      let items = tx.cart_items(cart.id).await?;
      if items.iter().any(|i| i.price_snapshot.currency != unit.price.currency) {
        return Err(TicketingError::BadRequest(format!(
          "Ticket type '{}' is priced in {}, which differs from the rest of the cart.",
          unit.name, unit.price.currency
        )));
      }
      let existing = items.into_iter().find(|i| i.stock_unit_ref == stock_unit_ref);
      let line_quantity = existing
        .as_ref()
        .map_or(0, |i| i.quantity)
        .checked_add(quantity)
        .filter(|q| *q <= unit.max_per_order)
        .ok_or_else(|| {
          TicketingError::BadRequest(format!(
            "At most {} tickets of type '{}' per purchase.",
            unit.max_per_order, unit.name
          ))
        })?;

      let reserved = tx.reserved_quantity(stock_unit_ref, now).await?;
      let available = unit.available_after_holds(reserved);
      if quantity > available {
        return Err(TicketingError::Conflict(format!(
          "Only {} tickets of type '{}' are available.",
          available, unit.name
        )));
      }

      let item = match existing {
        Some(mut item) => {
          tx.set_cart_item_quantity(item.id, line_quantity).await?;
          item.quantity = line_quantity;
          item
        }
        None => {
          let item = CartItem {
            id: Uuid::new_v4(),
            cart_id: cart.id,
            stock_unit_ref,
            quantity,
            price_snapshot: unit.price.clone(),
          };
          tx.insert_cart_item(&item).await?;
          item
        }
      };
      tx.commit().await?;
      Ok((item, unit, available - quantity, expired))
    })
    .await?;

    self.announce_expiry(expired);
    info!(cart = %item.cart_id, line_quantity = item.quantity, available, "Hold placed.");
    push_stock_level(self.notifier.as_ref(), self.settings.low_stock_threshold, &unit, available);
    Ok(item)
  }

  /// Drops one line from the owner's cart, releasing its hold.
  #[instrument(name = "remove_hold", skip(self))]
  pub async fn remove_hold(&self, owner_id: Uuid, item_id: Uuid) -> Result<()> {
    let now = self.clock.now();
    let released = within_deadline(self.settings.transaction_timeout, "remove_hold", async {
      let mut tx = self.store.begin().await?;
      let missing = || TicketingError::NotFound(format!("Item {} is not in the cart.", item_id));

      let cart = tx
        .lock_cart(owner_id)
        .await?
        .filter(|c| c.is_active(now))
        .ok_or_else(missing)?;
      let item = tx
        .cart_items(cart.id)
        .await?
        .into_iter()
        .find(|i| i.id == item_id)
        .ok_or_else(missing)?;
      if !tx.delete_cart_item(cart.id, item_id).await? {
        return Err(missing());
      }

      let unit = tx.find_stock_unit(item.stock_unit_ref).await?;
      let released = match unit {
        Some(unit) => {
          let reserved = tx.reserved_quantity(unit.id, now).await?;
          let available = unit.available_after_holds(reserved);
          Some((unit, available))
        }
        None => None,
      };
      tx.commit().await?;
      Ok(released)
    })
    .await?;

    info!(item = %item_id, "Hold removed.");
    if let Some((unit, available)) = released {
      push_stock_level(self.notifier.as_ref(), self.settings.low_stock_threshold, &unit, available);
    }
    Ok(())
  }

  /// Empties the owner's cart. Returns how many lines were removed.
  #[instrument(name = "clear_cart", skip(self))]
  pub async fn clear_cart(&self, owner_id: Uuid) -> Result<u64> {
    let removed = within_deadline(self.settings.transaction_timeout, "clear_cart", async {
      let mut tx = self.store.begin().await?;
      let removed = match tx.lock_cart(owner_id).await? {
        Some(cart) => tx.clear_cart_items(cart.id).await?,
        None => 0,
      };
      tx.commit().await?;
      Ok(removed)
    })
    .await?;
    debug!(removed, "Cart cleared.");
    Ok(removed)
  }

  /// Read-only view of the owner's cart. Never creates or renews a cart;
  /// an absent or expired cart reads as empty.
  #[instrument(name = "cart_snapshot", skip(self))]
  pub async fn snapshot(&self, owner_id: Uuid) -> Result<CartView> {
    let now = self.clock.now();
    within_deadline(self.settings.transaction_timeout, "cart_snapshot", async {
      let mut tx = self.store.begin().await?;
      let cart = match tx.find_cart(owner_id).await? {
        Some(cart) if cart.is_active(now) => cart,
        _ => {
          tx.rollback().await?;
          return Ok(CartView::empty());
        }
      };

      let mut lines = Vec::new();
      let mut total_cents: i64 = 0;
      let mut currency = None;
      for item in tx.cart_items(cart.id).await? {
        let Some(unit) = tx.find_stock_unit(item.stock_unit_ref).await? else {
          warn!(item = %item.id, "Cart line points at a missing ticket type; skipped.");
          continue;
        };
        let line = cart_line(&item, &unit)?;
        total_cents = total_cents
          .checked_add(line.subtotal.amount_cents)
          .ok_or_else(|| TicketingError::BadRequest("Cart total overflows.".to_string()))?;
        currency.get_or_insert_with(|| line.unit_price.currency.clone());
        lines.push(line);
      }
      tx.rollback().await?;

      Ok(CartView {
        cart_id: Some(cart.id),
        lines,
        total_cents,
        currency,
        expires_in_seconds: cart.seconds_remaining(now),
      })
    })
    .await
  }

  fn announce_expiry(&self, expired: Option<LiveUpdate>) {
    if let Some(update) = expired {
      push(self.notifier.as_ref(), update);
    }
  }
}

fn cart_line(item: &CartItem, unit: &StockUnit) -> Result<CartLine> {
  let subtotal = item
    .subtotal()
    .ok_or_else(|| TicketingError::BadRequest("Cart line subtotal overflows.".to_string()))?;
  Ok(CartLine {
    item_id: item.id,
    stock_unit_ref: item.stock_unit_ref,
    event_ref: unit.event_ref,
    name: unit.name.clone(),
    quantity: item.quantity,
    unit_price: item.price_snapshot.clone(),
    subtotal,
  })
}

/// Leases the owner's cart inside `tx`: creates it when absent and renews it
/// (dropping its items) when expired. A renewal that released holds also
/// yields the cart-expired notice to push once the transaction commits.
async fn resolve_cart(
  tx: &mut dyn StoreTx,
  owner_id: Uuid,
  now: DateTime<Utc>,
  settings: &CoreSettings,
) -> Result<(Cart, Option<LiveUpdate>)> {
  let expires_at = now + settings.cart_ttl;
  match tx.lock_cart(owner_id).await? {
    Some(cart) if cart.is_active(now) => Ok((cart, None)),
    Some(mut cart) => {
      let dropped = tx.clear_cart_items(cart.id).await?;
      tx.set_cart_expiry(cart.id, expires_at).await?;
      debug!(cart = %cart.id, dropped, "Expired cart renewed.");
      // An expired cart emptied by checkout has nothing to announce.
      let notice = (dropped > 0).then(|| LiveUpdate::CartExpired {
        owner_id,
        cart_id: cart.id,
        expired_at: cart.expires_at,
        items_released: dropped,
      });
      cart.expires_at = expires_at;
      Ok((cart, notice))
    }
    None => {
      let candidate = Cart {
        id: Uuid::new_v4(),
        owner_id,
        expires_at,
      };
      let cart = tx.insert_cart_if_absent(&candidate).await?;
      if cart.id == candidate.id {
        debug!(cart = %cart.id, "Cart created.");
      }
      Ok((cart, None))
    }
  }
}
