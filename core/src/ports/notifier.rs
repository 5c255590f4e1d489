// core/src/ports/notifier.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Real-time pushes to connected clients. All of them are best-effort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum LiveUpdate {
  StockUpdated {
    event_ref: Uuid,
    stock_unit_ref: Uuid,
    available: u32,
  },
  LowStock {
    event_ref: Uuid,
    stock_unit_ref: Uuid,
    available: u32,
  },
  /// The owner's cart ran out of time; its held tickets went back on sale.
  CartExpired {
    owner_id: Uuid,
    cart_id: Uuid,
    expired_at: DateTime<Utc>,
    items_released: u64,
  },
  PaymentStatus {
    owner_id: Uuid,
    approved: bool,
    message: String,
  },
  TicketsIssued {
    owner_id: Uuid,
    order_id: Uuid,
    count: usize,
  },
  TicketValidated {
    event_ref: Uuid,
    code: String,
  },
}

#[derive(Debug, Error)]
#[error("Live notification dropped: {0}")]
pub struct NotifyError(pub String);

pub trait LiveNotifier: Send + Sync {
  fn push(&self, update: LiveUpdate) -> Result<(), NotifyError>;
}
