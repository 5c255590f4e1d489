// core/src/models/order.rs

use super::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
  Pending,
  Completed,
  Failed,
  Refunded,
}

impl OrderStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "PENDING",
      OrderStatus::Completed => "COMPLETED",
      OrderStatus::Failed => "FAILED",
      OrderStatus::Refunded => "REFUNDED",
    }
  }

  /// Orders are write-once apart from a refund of a completed order.
  pub fn can_transition_to(&self, next: OrderStatus) -> bool {
    matches!((self, next), (OrderStatus::Completed, OrderStatus::Refunded))
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "PENDING" => Ok(OrderStatus::Pending),
      "COMPLETED" => Ok(OrderStatus::Completed),
      "FAILED" => Ok(OrderStatus::Failed),
      "REFUNDED" => Ok(OrderStatus::Refunded),
      other => Err(format!("unknown order status '{}'", other)),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingAddress {
  pub full_name: String,
  pub email: String,
  pub line1: String,
  pub city: String,
  pub country: String,
}

/// What the buyer hands over at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
  pub method_ref: String,
  pub billing_address: BillingAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
  pub id: Uuid,
  pub public_code: String,
  pub owner_id: Uuid,
  pub total: Money,
  pub status: OrderStatus,
  pub payment_ref: Option<String>,
  pub billing_address: BillingAddress,
  pub created_at: DateTime<Utc>,
}

impl Order {
  /// `ORD-` followed by 32 upper-case hex digits.
  pub fn generate_public_code() -> String {
    format!("ORD-{}", Uuid::new_v4().simple().to_string().to_uppercase())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: Uuid,
  pub stock_unit_ref: Uuid,
  pub quantity: u32,
  pub price_at_purchase: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDetail {
  pub order: Order,
  pub items: Vec<OrderItem>,
}

/// One page of a listing, plus the figures needed to page through the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
  pub items: Vec<T>,
  pub page: u32,
  pub page_size: u32,
  pub total_items: u64,
  pub total_pages: u64,
}

impl<T> Page<T> {
  pub fn new(items: Vec<T>, page: u32, page_size: u32, total_items: u64) -> Self {
    let total_pages = if page_size == 0 {
      0
    } else {
      total_items.div_ceil(u64::from(page_size))
    };
    Self {
      items,
      page,
      page_size,
      total_items,
      total_pages,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn public_code_shape() {
    let code = Order::generate_public_code();
    assert!(code.starts_with("ORD-"));
    assert_eq!(code.len(), 36);
    assert!(code[4..].chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
  }

  #[test]
  fn only_completed_orders_can_be_refunded() {
    assert!(OrderStatus::Completed.can_transition_to(OrderStatus::Refunded));
    assert!(!OrderStatus::Refunded.can_transition_to(OrderStatus::Completed));
    assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Refunded));
  }

  #[test]
  fn page_counts_round_up() {
    let page: Page<u8> = Page::new(vec![], 1, 10, 21);
    assert_eq!(page.total_pages, 3);
  }
}
