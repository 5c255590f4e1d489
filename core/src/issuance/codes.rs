// core/src/issuance/codes.rs

use uuid::Uuid;

/// `TKT-{EVENT8}-{ITEM32}-{NN}`: the first 8 upper-hex digits of the event id,
/// the full order item id in upper hex, and the 1-based position of the
/// ticket within that item.
///
/// The order item id alone makes the code unique across the system.
pub fn ticket_code(event_ref: Uuid, order_item_ref: Uuid, index: usize) -> String {
  let event = event_ref.simple().to_string().to_uppercase();
  let item = order_item_ref.simple().to_string().to_uppercase();
  format!("TKT-{}-{}-{:02}", &event[..8], item, index + 1)
}
