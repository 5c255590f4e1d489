// service/src/models/ticket.rs

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use ticketing_core::models::{Ticket, TicketStatus};
use ticketing_core::StoreError;
use uuid::Uuid;

pub const TICKET_COLUMNS: &str = "id, order_item_ref, owner_id, event_ref, code, status, signed_payload, holder_name, \
   check_in_at, issued_at";

#[derive(Debug, Clone, FromRow)]
pub struct TicketRow {
  pub id: Uuid,
  pub order_item_ref: Uuid,
  pub owner_id: Uuid,
  pub event_ref: Uuid,
  pub code: String,
  pub status: String,
  pub signed_payload: String,
  pub holder_name: String,
  pub check_in_at: Option<DateTime<Utc>>,
  pub issued_at: DateTime<Utc>,
}

impl TryFrom<TicketRow> for Ticket {
  type Error = StoreError;

  fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
    let status: TicketStatus = row.status.parse().map_err(StoreError::Corrupt)?;
    Ok(Ticket {
      id: row.id,
      order_item_ref: row.order_item_ref,
      owner_id: row.owner_id,
      event_ref: row.event_ref,
      code: row.code,
      status,
      signed_payload: row.signed_payload,
      holder_name: row.holder_name,
      check_in_at: row.check_in_at,
      issued_at: row.issued_at,
    })
  }
}
