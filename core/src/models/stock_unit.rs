// core/src/models/stock_unit.rs

//! The stock ledger record of one sellable ticket type, and its rules.

use super::money::Money;
use crate::error::{Result, TicketingError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleWindow {
  pub start: DateTime<Utc>,
  pub end: DateTime<Utc>,
}

impl SaleWindow {
  pub fn contains(&self, at: DateTime<Utc>) -> bool {
    self.start <= at && at < self.end
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockUnit {
  pub id: Uuid,
  pub event_ref: Uuid,
  pub name: String,
  pub description: Option<String>,
  pub price: Money,
  pub total_quantity: u32,
  /// Never exceeds `total_quantity`.
  pub sold_count: u32,
  pub min_per_order: u32,
  pub max_per_order: u32,
  pub sale_window: SaleWindow,
}

impl StockUnit {
  /// Units not yet sold. Holds are not subtracted here.
  pub fn remaining(&self) -> u32 {
    self.total_quantity.saturating_sub(self.sold_count)
  }

  /// Units neither sold nor held by an active cart.
  pub fn available_after_holds(&self, reserved: u32) -> u32 {
    self.remaining().saturating_sub(reserved)
  }

  pub fn is_on_sale(&self, now: DateTime<Utc>) -> bool {
    self.sale_window.contains(now)
  }

  pub fn can_sell(&self, quantity: u32) -> bool {
    quantity <= self.remaining()
  }

  /// Checks the static shape of a unit: bounds, window, price and currency.
  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(TicketingError::BadRequest("Ticket type name must not be empty.".to_string()));
    }
    if self.min_per_order == 0 {
      return Err(TicketingError::BadRequest(
        "Minimum per order must be at least 1.".to_string(),
      ));
    }
    if self.max_per_order < self.min_per_order {
      return Err(TicketingError::BadRequest(format!(
        "Maximum per order ({}) is below minimum per order ({}).",
        self.max_per_order, self.min_per_order
      )));
    }
    if self.sale_window.start >= self.sale_window.end {
      return Err(TicketingError::BadRequest(
        "Sale window must start before it ends.".to_string(),
      ));
    }
    if self.price.amount_cents < 0 {
      return Err(TicketingError::BadRequest("Price must not be negative.".to_string()));
    }
    if !Money::is_valid_currency(&self.price.currency) {
      return Err(TicketingError::BadRequest(format!(
        "Invalid currency code '{}'.",
        self.price.currency
      )));
    }
    if self.sold_count > self.total_quantity {
      return Err(TicketingError::Conflict(format!(
        "Cannot set quantity to {} because {} tickets are already sold.",
        self.total_quantity, self.sold_count
      )));
    }
    Ok(())
  }
}

/// Input for registering a ticket type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStockUnit {
  pub event_ref: Uuid,
  pub name: String,
  pub description: Option<String>,
  pub price: Money,
  pub total_quantity: u32,
  pub min_per_order: u32,
  pub max_per_order: u32,
  pub sale_window: SaleWindow,
}

impl NewStockUnit {
  pub fn into_stock_unit(self, id: Uuid) -> StockUnit {
    StockUnit {
      id,
      event_ref: self.event_ref,
      name: self.name,
      description: self.description,
      price: self.price,
      total_quantity: self.total_quantity,
      sold_count: 0,
      min_per_order: self.min_per_order,
      max_per_order: self.max_per_order,
      sale_window: self.sale_window,
    }
  }
}

/// Partial update of a ticket type. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockUnitChanges {
  pub name: Option<String>,
  pub description: Option<String>,
  pub price: Option<Money>,
  pub total_quantity: Option<u32>,
  pub min_per_order: Option<u32>,
  pub max_per_order: Option<u32>,
  pub sale_window: Option<SaleWindow>,
}

impl StockUnitChanges {
  pub fn apply_to(self, unit: &mut StockUnit) {
    if let Some(name) = self.name {
      unit.name = name;
    }
    if let Some(description) = self.description {
      unit.description = Some(description);
    }
    if let Some(price) = self.price {
      unit.price = price;
    }
    if let Some(total_quantity) = self.total_quantity {
      unit.total_quantity = total_quantity;
    }
    if let Some(min_per_order) = self.min_per_order {
      unit.min_per_order = min_per_order;
    }
    if let Some(max_per_order) = self.max_per_order {
      unit.max_per_order = max_per_order;
    }
    if let Some(sale_window) = self.sale_window {
      unit.sale_window = sale_window;
    }
  }
}

/// Point-in-time stock figures for one ticket type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockStatus {
  pub stock_unit_ref: Uuid,
  pub event_ref: Uuid,
  pub available: u32,
  pub total: u32,
  pub sold: u32,
  pub percent_sold: f64,
}

impl From<&StockUnit> for StockStatus {
  fn from(unit: &StockUnit) -> Self {
    let percent_sold = if unit.total_quantity == 0 {
      0.0
    } else {
      (f64::from(unit.sold_count) * 1000.0 / f64::from(unit.total_quantity)).round() / 10.0
    };
    Self {
      stock_unit_ref: unit.id,
      event_ref: unit.event_ref,
      available: unit.remaining(),
      total: unit.total_quantity,
      sold: unit.sold_count,
      percent_sold,
    }
  }
}
