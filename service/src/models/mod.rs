// service/src/models/mod.rs

//! Database rows, mapped into the core's domain records.

pub mod cart;
pub mod order;
pub mod stock_unit;
pub mod ticket;

pub use cart::{CartItemRow, CartRow};
pub use order::{OrderItemRow, OrderRow};
pub use stock_unit::StockUnitRow;
pub use ticket::TicketRow;

use ticketing_core::StoreError;

/// Non-negative `INTEGER` column into a domain quantity.
pub(crate) fn quantity(column: &str, value: i32) -> Result<u32, StoreError> {
  u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{} holds negative value {}", column, value)))
}
