// service/src/services/notifications.rs

//! Consumers of the bus and the live channel.

use super::email_mock::{send_mock_email, OutgoingMail};
use tokio::sync::{broadcast, mpsc};
use ticketing_core::ports::{DomainEvent, LiveUpdate};
use tracing::{debug, error, info, warn};

/// Builds the buyer mail for a bus message. Refunds without an address on
/// the event are not mailed.
pub fn compose_mail(event: &DomainEvent) -> Option<OutgoingMail> {
  match event {
    DomainEvent::PurchaseCompleted {
      public_code,
      buyer_email,
      buyer_name,
      total,
      lines,
      ticket_count,
      ..
    } => {
      let rows: String = lines
        .iter()
        .map(|line| format!("<li>{} x {} at {}</li>", line.quantity, line.stock_unit_ref, line.unit_price))
        .collect();
      Some(OutgoingMail {
        to: buyer_email.clone(),
        subject: format!("Your tickets for order {}", public_code),
        html_body: format!(
          "<p>Hi {},</p><p>{} ticket(s) are ready in your account. Total charged: {}.</p><ul>{}</ul>",
          buyer_name, ticket_count, total, rows
        ),
      })
    }
    DomainEvent::OrderRefunded { .. } => None,
  }
}

/// Drains the bus until every publisher is dropped.
pub async fn run_mailer(mut events: mpsc::Receiver<DomainEvent>, sender: String) {
  info!("Purchase mailer started.");
  while let Some(event) = events.recv().await {
    let topic = event.topic();
    match &event {
      DomainEvent::OrderRefunded {
        public_code,
        amount,
        cancelled_tickets,
        ..
      } => {
        info!(topic, order = %public_code, %amount, cancelled_tickets, "Refund recorded; payout handled by finance.");
      }
      DomainEvent::PurchaseCompleted { public_code, .. } => {
        info!(topic, order = %public_code, "Purchase received on the bus.");
      }
    }
    let Some(mail) = compose_mail(&event) else {
      continue;
    };
    match send_mock_email(&sender, &mail).await {
      Ok(sent) => debug!(message_id = %sent.message_id, to = %sent.to, "Confirmation mailed."),
      Err(e) => error!(error = %e, topic, "Failed to mail confirmation."),
    }
  }
  info!("Purchase mailer stopped: bus closed.");
}

/// Mirrors the live channel into the log until it closes.
pub async fn relay_live_updates(mut updates: broadcast::Receiver<LiveUpdate>) {
  loop {
    match updates.recv().await {
      Ok(update) => match serde_json::to_string(&update) {
        Ok(json) => info!(target: "live", "{}", json),
        Err(e) => warn!(error = %e, "Could not serialise live update."),
      },
      Err(broadcast::error::RecvError::Lagged(skipped)) => {
        warn!(skipped, "Live relay fell behind; updates skipped.");
      }
      Err(broadcast::error::RecvError::Closed) => break,
    }
  }
}
