// core/src/issuance/check_in.rs

use super::signing::TicketSigner;
use crate::clock::Clock;
use crate::error::{Result, TicketingError};
use crate::models::{Ticket, TicketFilter, TicketStatus};
use crate::ports::{LiveNotifier, LiveUpdate, TicketingStore};
use crate::settings::CoreSettings;
use crate::transaction::within_deadline;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInStatus {
  /// First successful scan; the ticket is now USED.
  Admitted,
  /// The ticket was already used. Scanning again is harmless.
  AlreadyAdmitted,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckInOutcome {
  pub status: CheckInStatus,
  pub message: String,
  pub ticket: Ticket,
}

/// Validates presented tickets at the gate and lists an owner's tickets.
pub struct CheckInService {
  store: Arc<dyn TicketingStore>,
  signer: TicketSigner,
  clock: Arc<dyn Clock>,
  notifier: Arc<dyn LiveNotifier>,
  settings: CoreSettings,
}

impl CheckInService {
  pub fn new(
    store: Arc<dyn TicketingStore>,
    signer: TicketSigner,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn LiveNotifier>,
    settings: CoreSettings,
  ) -> Self {
    Self {
      store,
      signer,
      clock,
      notifier,
      settings,
    }
  }

  /// Authenticates the payload, then moves the ticket VALID → USED.
  ///
  /// The signature is checked before the store is touched. A USED ticket
  /// reports success with its original `check_in_at`; a CANCELLED ticket is
  /// `Gone`.
  #[instrument(name = "check_in", skip(self, presented))]
  pub async fn check_in(&self, presented: &str) -> Result<CheckInOutcome> {
    let claims = self.signer.verify(presented).map_err(|e| {
      warn!(error = %e, "Rejected presented ticket.");
      e
    })?;

    let now = self.clock.now();
    let outcome = within_deadline(self.settings.transaction_timeout, "check_in", async {
      let mut tx = self.store.begin().await?;
      let mut ticket = tx
        .lock_ticket_by_code(&claims.code)
        .await?
        .ok_or_else(|| TicketingError::NotFound(format!("Ticket '{}' does not exist.", claims.code)))?;

      if ticket.event_ref != claims.event_ref || ticket.owner_id != claims.owner_id {
        return Err(TicketingError::BadRequest(
          "Ticket payload does not match the issued ticket.".to_string(),
        ));
      }

      match ticket.status {
        TicketStatus::Valid => {
          tx.set_ticket_status(ticket.id, TicketStatus::Used, Some(now)).await?;
          tx.commit().await?;
          ticket.status = TicketStatus::Used;
          ticket.check_in_at = Some(now);
          Ok(CheckInOutcome {
            status: CheckInStatus::Admitted,
            message: "Ticket validated. Entry granted.".to_string(),
            ticket,
          })
        }
        TicketStatus::Used => {
          let at = ticket
            .check_in_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "an unknown time".to_string());
          Ok(CheckInOutcome {
            status: CheckInStatus::AlreadyAdmitted,
            message: format!("Ticket already validated at {}.", at),
            ticket,
          })
        }
        TicketStatus::Cancelled => Err(TicketingError::Gone(format!(
          "Ticket '{}' has been cancelled.",
          ticket.code
        ))),
      }
    })
    .await?;

    info!(code = %outcome.ticket.code, status = ?outcome.status, "Ticket checked in.");
    if outcome.status == CheckInStatus::Admitted {
      let update = LiveUpdate::TicketValidated {
        event_ref: outcome.ticket.event_ref,
        code: outcome.ticket.code.clone(),
      };
      if let Err(e) = self.notifier.push(update) {
        warn!(error = %e, "Ticket validated push failed.");
      }
    }
    Ok(outcome)
  }

  #[instrument(name = "tickets_for_owner", skip(self))]
  pub async fn tickets_for_owner(&self, owner_id: Uuid, filter: TicketFilter) -> Result<Vec<Ticket>> {
    within_deadline(self.settings.transaction_timeout, "tickets_for_owner", async {
      let mut tx = self.store.begin().await?;
      let tickets = tx.list_tickets(owner_id, filter).await?;
      tx.rollback().await?;
      Ok(tickets)
    })
    .await
  }

  /// One of the owner's tickets. Other owners' tickets read as absent.
  #[instrument(name = "ticket_for_owner", skip(self))]
  pub async fn ticket_for_owner(&self, owner_id: Uuid, ticket_id: Uuid) -> Result<Ticket> {
    within_deadline(self.settings.transaction_timeout, "ticket_for_owner", async {
      let mut tx = self.store.begin().await?;
      let ticket = tx
        .find_ticket(ticket_id)
        .await?
        .filter(|t| t.owner_id == owner_id)
        .ok_or_else(|| TicketingError::NotFound(format!("Ticket {} does not exist.", ticket_id)))?;
      tx.rollback().await?;
      Ok(ticket)
    })
    .await
  }
}
