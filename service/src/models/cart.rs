// service/src/models/cart.rs

use super::quantity;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use ticketing_core::models::{Cart, CartItem, Money};
use ticketing_core::StoreError;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct CartRow {
  pub id: Uuid,
  pub owner_id: Uuid,
  pub expires_at: DateTime<Utc>,
}

impl From<CartRow> for Cart {
  fn from(row: CartRow) -> Self {
    Cart {
      id: row.id,
      owner_id: row.owner_id,
      expires_at: row.expires_at,
    }
  }
}

#[derive(Debug, Clone, FromRow)]
pub struct CartItemRow {
  pub id: Uuid,
  pub cart_id: Uuid,
  pub stock_unit_ref: Uuid,
  pub quantity: i32,
  pub price_snapshot_cents: i64,
  pub currency: String,
}

impl TryFrom<CartItemRow> for CartItem {
  type Error = StoreError;

  fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
    Ok(CartItem {
      id: row.id,
      cart_id: row.cart_id,
      stock_unit_ref: row.stock_unit_ref,
      quantity: quantity("cart_items.quantity", row.quantity)?,
      price_snapshot: Money::new(row.price_snapshot_cents, row.currency),
    })
  }
}
