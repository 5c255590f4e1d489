// tests/check_in_tests.rs
mod common;

use chrono::Duration;
use common::*;
use ticketing_core::models::{Ticket, TicketFilter, TicketStatus};
use ticketing_core::ports::LiveUpdate;
use ticketing_core::{CheckInStatus, Clock, ErrorKind, TicketSigner, TicketingError};
use uuid::Uuid;

async fn purchased(h: &Harness, quantity: u32) -> (Uuid, Vec<Ticket>) {
  let unit = h.ticket_type(20, 2000).await;
  let owner = Uuid::new_v4();
  h.reservations.add_hold(owner, unit.id, quantity).await.unwrap();
  h.fulfillment.commit_order(owner, payment("card_ok")).await.unwrap();
  let tickets = h.tickets_of(owner).await;
  (owner, tickets)
}

#[tokio::test]
async fn test_valid_ticket_is_admitted_once() {
  let h = Harness::new();
  let (_, tickets) = purchased(&h, 1).await;
  let ticket = &tickets[0];

  let first = h.gate.check_in(&ticket.signed_payload).await.unwrap();
  assert_eq!(first.status, CheckInStatus::Admitted);
  assert_eq!(first.ticket.status, TicketStatus::Used);
  let admitted_at = h.clock.now();
  assert_eq!(first.ticket.check_in_at, Some(admitted_at));

  h.clock.advance(Duration::minutes(5));
  let second = h.gate.check_in(&ticket.signed_payload).await.unwrap();
  assert_eq!(second.status, CheckInStatus::AlreadyAdmitted);
  assert_eq!(second.ticket.check_in_at, Some(admitted_at));

  assert!(h.notifier.updates().contains(&LiveUpdate::TicketValidated {
    event_ref: h.event,
    code: ticket.code.clone(),
  }));
}

#[tokio::test]
async fn test_every_single_byte_flip_is_rejected() {
  let h = Harness::new();
  let (owner, tickets) = purchased(&h, 1).await;
  let original = tickets[0].signed_payload.clone().into_bytes();

  for index in 0..original.len() {
    let mut tampered = original.clone();
    tampered[index] ^= 0x01;
    let tampered = String::from_utf8(tampered).unwrap();

    let err = h.gate.check_in(&tampered).await.unwrap_err();
    assert!(
      matches!(err, TicketingError::BadRequest(_)),
      "flip at byte {index} gave {err}"
    );
  }

  let unchanged = h.tickets_of(owner).await;
  assert_eq!(unchanged[0].status, TicketStatus::Valid);
}

#[tokio::test]
async fn test_foreign_signature_is_rejected_before_lookup() {
  let h = Harness::new();
  let (_, tickets) = purchased(&h, 1).await;
  let ticket = &tickets[0];

  let forger = TicketSigner::new(b"not-the-gate-secret").unwrap();
  let forged = forger.sign(&ticket.code, ticket.event_ref, ticket.owner_id);
  let err = h.gate.check_in(&forged).await.unwrap_err();
  assert!(matches!(err, TicketingError::BadRequest(_)));
}

#[tokio::test]
async fn test_malformed_and_unsigned_payloads_are_bad_requests() {
  let h = Harness::new();
  let (_, tickets) = purchased(&h, 1).await;
  let ticket = &tickets[0];

  let unsigned = TicketSigner::canonical_payload(&ticket.code, ticket.event_ref, ticket.owner_id);
  for presented in ["", "not json", "{}", unsigned.as_str()] {
    let err = h.gate.check_in(presented).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest, "payload {presented:?}");
  }
}

#[tokio::test]
async fn test_unknown_code_with_valid_signature_is_not_found() {
  let h = Harness::new();
  let payload = h.signer.sign("TKT-00000000-UNKNOWN-01", h.event, Uuid::new_v4());

  let err = h.gate.check_in(&payload).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_cancelled_ticket_is_gone_forever() {
  let h = Harness::new();
  let (owner, tickets) = purchased(&h, 2).await;
  let order = h.fulfillment.orders_for_owner(owner, 1, 10).await.unwrap().items.remove(0);
  h.fulfillment.refund_order(owner, order.id).await.unwrap();

  for _ in 0..2 {
    let err = h.gate.check_in(&tickets[0].signed_payload).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Gone);
  }
  let after = h.tickets_of(owner).await;
  assert!(after.iter().all(|t| t.status == TicketStatus::Cancelled && t.check_in_at.is_none()));
}

#[tokio::test]
async fn test_tickets_for_owner_filters() {
  let h = Harness::new();
  let (owner, tickets) = purchased(&h, 3).await;
  h.gate.check_in(&tickets[1].signed_payload).await.unwrap();

  let used = h
    .gate
    .tickets_for_owner(
      owner,
      TicketFilter {
        status: Some(TicketStatus::Used),
        ..Default::default()
      },
    )
    .await
    .unwrap();
  assert_eq!(used.len(), 1);
  assert_eq!(used[0].code, tickets[1].code);

  let for_event = h
    .gate
    .tickets_for_owner(
      owner,
      TicketFilter {
        event_ref: Some(h.event),
        ..Default::default()
      },
    )
    .await
    .unwrap();
  assert_eq!(for_event.len(), 3);

  let elsewhere = h
    .gate
    .tickets_for_owner(
      owner,
      TicketFilter {
        event_ref: Some(Uuid::new_v4()),
        ..Default::default()
      },
    )
    .await
    .unwrap();
  assert!(elsewhere.is_empty());
}

#[tokio::test]
async fn test_ticket_for_owner_hides_other_owners_tickets() {
  let h = Harness::new();
  let (owner, tickets) = purchased(&h, 2).await;
  let ticket = &tickets[0];

  let found = h.gate.ticket_for_owner(owner, ticket.id).await.unwrap();
  assert_eq!(&found, ticket);

  let stranger = h.gate.ticket_for_owner(Uuid::new_v4(), ticket.id).await.unwrap_err();
  assert_eq!(stranger.kind(), ErrorKind::NotFound);

  let missing = h.gate.ticket_for_owner(owner, Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(missing, TicketingError::NotFound(_)));
}
