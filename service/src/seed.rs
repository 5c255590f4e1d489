// service/src/seed.rs

//! Demo data: one event with two ticket types and a completed purchase whose
//! signed payloads are logged for use with the gate.

use crate::errors::Result as AppResult;
use crate::state::AppState;
use chrono::{Duration, Utc};
use ticketing_core::models::{BillingAddress, Money, NewStockUnit, PaymentDetails, SaleWindow, TicketFilter};
use ticketing_core::TicketingError;
use tracing::{info, instrument};
use uuid::Uuid;

#[instrument(name = "seed_db", skip(state))]
pub async fn seed_db(state: &AppState) -> AppResult<()> {
  let existing = state.catalog.event_count().await.map_err(TicketingError::from)?;
  if existing > 0 {
    info!(existing, "Events already present; skipping seed.");
    return Ok(());
  }

  let now = Utc::now();
  let event_id = Uuid::new_v4();
  let starts_at = now + Duration::days(30);
  state
    .catalog
    .upsert_event(event_id, "Launch Night", starts_at)
    .await
    .map_err(TicketingError::from)?;

  let window = SaleWindow {
    start: now - Duration::minutes(1),
    end: starts_at,
  };
  let general = state
    .ledger
    .register(NewStockUnit {
      event_ref: event_id,
      name: "General Admission".to_string(),
      description: Some("Standing room".to_string()),
      price: Money::new(2000, "USD"),
      total_quantity: 500,
      min_per_order: 1,
      max_per_order: 10,
      sale_window: window,
    })
    .await?;
  let vip = state
    .ledger
    .register(NewStockUnit {
      event_ref: event_id,
      name: "VIP".to_string(),
      description: Some("Balcony seating and early entry".to_string()),
      price: Money::new(7500, "USD"),
      total_quantity: 50,
      min_per_order: 1,
      max_per_order: 4,
      sale_window: window,
    })
    .await?;
  info!(event = %event_id, general = %general.id, vip = %vip.id, "Seeded event and ticket types.");

  let buyer = Uuid::new_v4();
  state.reservations.add_hold(buyer, general.id, 2).await?;
  state.reservations.add_hold(buyer, vip.id, 1).await?;
  let order = state
    .fulfillment
    .commit_order(
      buyer,
      PaymentDetails {
        method_ref: "card_demo".to_string(),
        billing_address: BillingAddress {
          full_name: "Demo Buyer".to_string(),
          email: "demo.buyer@example.com".to_string(),
          line1: "1 Main Street".to_string(),
          city: "Springfield".to_string(),
          country: "US".to_string(),
        },
      },
    )
    .await?;
  info!(order = %order.public_code, total = %order.total, "Seeded demo purchase.");

  for ticket in state.gate.tickets_for_owner(buyer, TicketFilter::default()).await? {
    info!(code = %ticket.code, payload = %ticket.signed_payload, "Demo ticket");
  }
  Ok(())
}
