// tests/ledger_tests.rs
mod common;

use common::*;
use ticketing_core::models::{Money, StockUnitChanges};
use ticketing_core::ports::LiveUpdate;
use ticketing_core::{ErrorKind, TicketingError};
use uuid::Uuid;

#[tokio::test]
async fn test_register_requires_known_event() {
  let h = Harness::new();
  let mut new_unit = h.new_ticket_type(10, 2000);
  new_unit.event_ref = Uuid::new_v4();

  let err = h.ledger.register(new_unit).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_register_validates_shape() {
  let h = Harness::new();

  let mut zero_min = h.new_ticket_type(10, 2000);
  zero_min.min_per_order = 0;
  let mut max_below_min = h.new_ticket_type(10, 2000);
  max_below_min.min_per_order = 4;
  max_below_min.max_per_order = 2;
  let mut inverted_window = h.new_ticket_type(10, 2000);
  inverted_window.sale_window.end = inverted_window.sale_window.start;
  let mut bad_currency = h.new_ticket_type(10, 2000);
  bad_currency.price = Money::new(2000, "usd");
  let mut negative_price = h.new_ticket_type(10, 2000);
  negative_price.price = Money::new(-1, "USD");

  for candidate in [zero_min, max_below_min, inverted_window, bad_currency, negative_price] {
    let err = h.ledger.register(candidate).await.unwrap_err();
    assert!(matches!(err, TicketingError::BadRequest(_)), "unexpected error: {err}");
  }
  assert!(h.ledger.list_for_event(h.event).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_register_then_read_back() {
  let h = Harness::new();
  let unit = h.ticket_type(50, 2000).await;

  let fetched = h.ledger.get(unit.id).await.unwrap();
  assert_eq!(fetched, unit);
  assert_eq!(fetched.sold_count, 0);
  assert_eq!(h.ledger.list_for_event(h.event).await.unwrap(), vec![unit]);
}

#[tokio::test]
async fn test_revise_cannot_drop_total_below_sold() {
  let h = Harness::new();
  let unit = h.ticket_type(10, 2000).await;
  let owner = Uuid::new_v4();
  h.reservations.add_hold(owner, unit.id, 3).await.unwrap();
  h.fulfillment.commit_order(owner, payment("card_ok")).await.unwrap();

  let too_small = StockUnitChanges {
    total_quantity: Some(2),
    ..Default::default()
  };
  let err = h.ledger.revise(unit.id, too_small).await.unwrap_err();
  assert!(matches!(err, TicketingError::Conflict(_)));
  assert_eq!(h.ledger.get(unit.id).await.unwrap().total_quantity, 10);

  let exact = StockUnitChanges {
    total_quantity: Some(3),
    name: Some("Early Bird".to_string()),
    ..Default::default()
  };
  let revised = h.ledger.revise(unit.id, exact).await.unwrap();
  assert_eq!(revised.total_quantity, 3);
  assert_eq!(revised.sold_count, 3);
  assert_eq!(revised.name, "Early Bird");
}

#[tokio::test]
async fn test_revise_unknown_unit_is_not_found() {
  let h = Harness::new();
  let err = h.ledger.revise(Uuid::new_v4(), StockUnitChanges::default()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_remove_refused_after_sales() {
  let h = Harness::new();
  let unit = h.ticket_type(10, 2000).await;
  let owner = Uuid::new_v4();
  h.reservations.add_hold(owner, unit.id, 1).await.unwrap();
  h.fulfillment.commit_order(owner, payment("card_ok")).await.unwrap();

  let err = h.ledger.remove(unit.id).await.unwrap_err();
  assert!(matches!(err, TicketingError::Conflict(_)));
  assert!(h.ledger.get(unit.id).await.is_ok());
}

#[tokio::test]
async fn test_remove_refused_while_held_then_allowed_after_expiry() {
  let h = Harness::new();
  let unit = h.ticket_type(10, 2000).await;
  h.reservations.add_hold(Uuid::new_v4(), unit.id, 2).await.unwrap();

  let err = h.ledger.remove(unit.id).await.unwrap_err();
  assert!(matches!(err, TicketingError::Conflict(_)));

  h.clock.advance(h.settings.cart_ttl + chrono::Duration::seconds(1));
  h.ledger.remove(unit.id).await.unwrap();
  assert_eq!(h.ledger.get(unit.id).await.unwrap_err().kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_stock_status_reports_percentage() {
  let h = Harness::new();
  let unit = h.ticket_type(8, 1500).await;
  let owner = Uuid::new_v4();
  h.reservations.add_hold(owner, unit.id, 2).await.unwrap();
  h.fulfillment.commit_order(owner, payment("card_ok")).await.unwrap();

  let status = h.ledger.stock_status(unit.id).await.unwrap();
  assert_eq!(status.total, 8);
  assert_eq!(status.sold, 2);
  assert_eq!(status.available, 6);
  assert_eq!(status.percent_sold, 25.0);
}

#[tokio::test]
async fn test_revise_pushes_low_stock_alert() {
  let h = Harness::new();
  let unit = h.ticket_type(100, 2000).await;

  let changes = StockUnitChanges {
    total_quantity: Some(5),
    ..Default::default()
  };
  h.ledger.revise(unit.id, changes).await.unwrap();

  let updates = h.notifier.updates();
  assert!(updates.contains(&LiveUpdate::StockUpdated {
    event_ref: h.event,
    stock_unit_ref: unit.id,
    available: 5,
  }));
  assert!(updates.contains(&LiveUpdate::LowStock {
    event_ref: h.event,
    stock_unit_ref: unit.id,
    available: 5,
  }));
}
