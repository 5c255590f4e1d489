// service/src/models/order.rs

use super::quantity;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use ticketing_core::models::{BillingAddress, Money, Order, OrderItem, OrderStatus};
use ticketing_core::StoreError;
use uuid::Uuid;

pub const ORDER_COLUMNS: &str =
  "id, public_code, owner_id, total_amount_cents, currency, status, payment_ref, billing_address, created_at";

// Status is stored as text and checked by the table constraint.
#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
  pub id: Uuid,
  pub public_code: String,
  pub owner_id: Uuid,
  pub total_amount_cents: i64,
  pub currency: String,
  pub status: String,
  pub payment_ref: Option<String>,
  pub billing_address: Json<BillingAddress>,
  pub created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
  type Error = StoreError;

  fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
    let status: OrderStatus = row.status.parse().map_err(StoreError::Corrupt)?;
    Ok(Order {
      id: row.id,
      public_code: row.public_code,
      owner_id: row.owner_id,
      total: Money::new(row.total_amount_cents, row.currency),
      status,
      payment_ref: row.payment_ref,
      billing_address: row.billing_address.0,
      created_at: row.created_at,
    })
  }
}

#[derive(Debug, Clone, FromRow)]
pub struct OrderItemRow {
  pub id: Uuid,
  pub order_id: Uuid,
  pub stock_unit_ref: Uuid,
  pub quantity: i32,
  pub price_at_purchase_cents: i64,
  pub currency: String,
}

impl TryFrom<OrderItemRow> for OrderItem {
  type Error = StoreError;

  fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
    Ok(OrderItem {
      id: row.id,
      order_id: row.order_id,
      stock_unit_ref: row.stock_unit_ref,
      quantity: quantity("order_items.quantity", row.quantity)?,
      price_at_purchase: Money::new(row.price_at_purchase_cents, row.currency),
    })
  }
}
