// core/src/issuance/minting.rs

use super::codes::ticket_code;
use super::signing::TicketSigner;
use crate::models::{Order, OrderItem, TicketDraft};
use uuid::Uuid;

/// Produces exactly `item.quantity` tickets for one order line.
///
/// Pure: the same inputs always yield the same drafts.
pub fn mint_tickets(order: &Order, item: &OrderItem, event_ref: Uuid, holder: &str, signer: &TicketSigner) -> Vec<TicketDraft> {
  (0..item.quantity as usize)
    .map(|index| {
      let code = ticket_code(event_ref, item.id, index);
      let signed_payload = signer.sign(&code, event_ref, order.owner_id);
      TicketDraft {
        order_item_ref: item.id,
        owner_id: order.owner_id,
        event_ref,
        code,
        signed_payload,
        holder_name: holder.to_string(),
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::{BillingAddress, Money, OrderStatus};
  use chrono::Utc;
  use std::collections::HashSet;

  fn order() -> Order {
    Order {
      id: Uuid::new_v4(),
      public_code: Order::generate_public_code(),
      owner_id: Uuid::new_v4(),
      total: Money::new(6000, "USD"),
      status: OrderStatus::Completed,
      payment_ref: Some("pay_1".to_string()),
      billing_address: BillingAddress {
        full_name: "Ada Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        line1: "1 Analytical St".to_string(),
        city: "London".to_string(),
        country: "GB".to_string(),
      },
      created_at: Utc::now(),
    }
  }

  #[test]
  fn mints_one_signed_ticket_per_unit() {
    let signer = TicketSigner::new(b"secret").unwrap();
    let order = order();
    let item = OrderItem {
      id: Uuid::new_v4(),
      order_id: order.id,
      stock_unit_ref: Uuid::new_v4(),
      quantity: 3,
      price_at_purchase: Money::new(2000, "USD"),
    };
    let event = Uuid::new_v4();

    let drafts = mint_tickets(&order, &item, event, "Ada Lovelace", &signer);

    assert_eq!(drafts.len(), 3);
    let codes: HashSet<_> = drafts.iter().map(|d| d.code.clone()).collect();
    assert_eq!(codes.len(), 3);
    for draft in &drafts {
      assert_eq!(draft.holder_name, "Ada Lovelace");
      assert_eq!(draft.owner_id, order.owner_id);
      let claims = signer.verify(&draft.signed_payload).unwrap();
      assert_eq!(claims.code, draft.code);
      assert_eq!(claims.event_ref, event);
    }
    assert_eq!(drafts, mint_tickets(&order, &item, event, "Ada Lovelace", &signer));
  }
}
