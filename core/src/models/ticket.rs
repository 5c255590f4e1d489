// core/src/models/ticket.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
  Valid,
  Used,
  Cancelled,
}

impl TicketStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      TicketStatus::Valid => "VALID",
      TicketStatus::Used => "USED",
      TicketStatus::Cancelled => "CANCELLED",
    }
  }
}

impl fmt::Display for TicketStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for TicketStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "VALID" => Ok(TicketStatus::Valid),
      "USED" => Ok(TicketStatus::Used),
      "CANCELLED" => Ok(TicketStatus::Cancelled),
      other => Err(format!("unknown ticket status '{}'", other)),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
  pub id: Uuid,
  pub order_item_ref: Uuid,
  pub owner_id: Uuid,
  pub event_ref: Uuid,
  pub code: String,
  pub status: TicketStatus,
  pub signed_payload: String,
  pub holder_name: String,
  pub check_in_at: Option<DateTime<Utc>>,
  pub issued_at: DateTime<Utc>,
}

/// A minted ticket that has not been given an identity or persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketDraft {
  pub order_item_ref: Uuid,
  pub owner_id: Uuid,
  pub event_ref: Uuid,
  pub code: String,
  pub signed_payload: String,
  pub holder_name: String,
}

impl TicketDraft {
  pub fn into_ticket(self, id: Uuid, issued_at: DateTime<Utc>) -> Ticket {
    Ticket {
      id,
      order_item_ref: self.order_item_ref,
      owner_id: self.owner_id,
      event_ref: self.event_ref,
      code: self.code,
      status: TicketStatus::Valid,
      signed_payload: self.signed_payload,
      holder_name: self.holder_name,
      check_in_at: None,
      issued_at,
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketFilter {
  pub event_ref: Option<Uuid>,
  pub status: Option<TicketStatus>,
}

impl TicketFilter {
  pub fn matches(&self, ticket: &Ticket) -> bool {
    self.event_ref.map_or(true, |event| ticket.event_ref == event)
      && self.status.map_or(true, |status| ticket.status == status)
  }
}
