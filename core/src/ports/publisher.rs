// core/src/ports/publisher.rs

use crate::models::{Money, OrderItem};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchasedLine {
  pub stock_unit_ref: Uuid,
  pub quantity: u32,
  pub unit_price: Money,
}

impl From<&OrderItem> for PurchasedLine {
  fn from(item: &OrderItem) -> Self {
    Self {
      stock_unit_ref: item.stock_unit_ref,
      quantity: item.quantity,
      unit_price: item.price_at_purchase.clone(),
    }
  }
}

/// Messages published to the bus after a state change has committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "topic", content = "payload")]
pub enum DomainEvent {
  #[serde(rename = "purchase.completed")]
  PurchaseCompleted {
    order_id: Uuid,
    public_code: String,
    owner_id: Uuid,
    buyer_email: String,
    buyer_name: String,
    total: Money,
    lines: Vec<PurchasedLine>,
    ticket_count: usize,
  },
  #[serde(rename = "order.refunded")]
  OrderRefunded {
    order_id: Uuid,
    public_code: String,
    owner_id: Uuid,
    payment_ref: Option<String>,
    amount: Money,
    cancelled_tickets: usize,
  },
}

impl DomainEvent {
  pub fn topic(&self) -> &'static str {
    match self {
      DomainEvent::PurchaseCompleted { .. } => "purchase.completed",
      DomainEvent::OrderRefunded { .. } => "order.refunded",
    }
  }
}

#[derive(Debug, Error)]
#[error("Failed to publish '{topic}': {reason}")]
pub struct PublishError {
  pub topic: String,
  pub reason: String,
}

/// Fire-and-forget message bus.
#[async_trait]
pub trait EventPublisher: Send + Sync {
  async fn publish(&self, event: DomainEvent) -> Result<(), PublishError>;
}
