// service/src/models/stock_unit.rs

use super::quantity;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use ticketing_core::models::{Money, SaleWindow, StockUnit};
use ticketing_core::StoreError;
use uuid::Uuid;

pub const STOCK_UNIT_COLUMNS: &str = "id, event_ref, name, description, price_cents, currency, total_quantity, \
   sold_count, min_per_order, max_per_order, sale_start, sale_end";

#[derive(Debug, Clone, FromRow)]
pub struct StockUnitRow {
  pub id: Uuid,
  pub event_ref: Uuid,
  pub name: String,
  pub description: Option<String>,
  pub price_cents: i64,
  pub currency: String,
  pub total_quantity: i32,
  pub sold_count: i32,
  pub min_per_order: i32,
  pub max_per_order: i32,
  pub sale_start: DateTime<Utc>,
  pub sale_end: DateTime<Utc>,
}

impl TryFrom<StockUnitRow> for StockUnit {
  type Error = StoreError;

  fn try_from(row: StockUnitRow) -> Result<Self, Self::Error> {
    Ok(StockUnit {
      id: row.id,
      event_ref: row.event_ref,
      name: row.name,
      description: row.description,
      price: Money::new(row.price_cents, row.currency),
      total_quantity: quantity("stock_units.total_quantity", row.total_quantity)?,
      sold_count: quantity("stock_units.sold_count", row.sold_count)?,
      min_per_order: quantity("stock_units.min_per_order", row.min_per_order)?,
      max_per_order: quantity("stock_units.max_per_order", row.max_per_order)?,
      sale_window: SaleWindow {
        start: row.sale_start,
        end: row.sale_end,
      },
    })
  }
}
