// core/src/models/cart.rs

use super::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A per-owner cart. Its items hold stock until `expires_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
  pub id: Uuid,
  pub owner_id: Uuid,
  pub expires_at: DateTime<Utc>,
}

impl Cart {
  pub fn is_active(&self, now: DateTime<Utc>) -> bool {
    self.expires_at > now
  }

  /// Whole seconds left before expiry, zero once expired.
  pub fn seconds_remaining(&self, now: DateTime<Utc>) -> i64 {
    (self.expires_at - now).num_seconds().max(0)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
  pub id: Uuid,
  pub cart_id: Uuid,
  pub stock_unit_ref: Uuid,
  pub quantity: u32,
  /// Unit price locked when the hold was placed.
  pub price_snapshot: Money,
}

impl CartItem {
  pub fn subtotal(&self) -> Option<Money> {
    self.price_snapshot.times(self.quantity)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
  pub item_id: Uuid,
  pub stock_unit_ref: Uuid,
  pub event_ref: Uuid,
  pub name: String,
  pub quantity: u32,
  pub unit_price: Money,
  pub subtotal: Money,
}

/// Read-only picture of an owner's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartView {
  pub cart_id: Option<Uuid>,
  pub lines: Vec<CartLine>,
  pub total_cents: i64,
  pub currency: Option<String>,
  pub expires_in_seconds: i64,
}

impl CartView {
  pub fn empty() -> Self {
    Self {
      cart_id: None,
      lines: Vec::new(),
      total_cents: 0,
      currency: None,
      expires_in_seconds: 0,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.lines.is_empty()
  }
}
