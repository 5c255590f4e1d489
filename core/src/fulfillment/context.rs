// core/src/fulfillment/context.rs

use crate::models::{Cart, CartItem, Money, Order, OrderItem, PaymentDetails, StockUnit, Ticket};
use crate::ports::PaymentOutcome;
use std::collections::HashMap;
use uuid::Uuid;

/// Everything the checkout steps read and produce, shared through `ContextData`.
#[derive(Debug, Clone)]
pub struct CheckoutState {
  pub owner_id: Uuid,
  pub payment: PaymentDetails,

  // load_cart
  pub cart: Option<Cart>,
  pub lines: Vec<CartItem>,
  // load_cart, refreshed by verify_stock
  pub units: HashMap<Uuid, StockUnit>,
  // price_order
  pub total: Option<Money>,
  // capture_payment
  pub payment_outcome: Option<PaymentOutcome>,
  // commit_order
  pub order: Option<Order>,
  pub order_items: Vec<OrderItem>,
  pub tickets: Vec<Ticket>,
  /// Ticket types touched by the order with their availability after holds.
  pub stock_after: Vec<(StockUnit, u32)>,
}

impl CheckoutState {
  pub fn new(owner_id: Uuid, payment: PaymentDetails) -> Self {
    Self {
      owner_id,
      payment,
      cart: None,
      lines: Vec::new(),
      units: HashMap::new(),
      total: None,
      payment_outcome: None,
      order: None,
      order_items: Vec::new(),
      tickets: Vec::new(),
      stock_after: Vec::new(),
    }
  }

  pub fn payment_ref(&self) -> Option<&str> {
    self.payment_outcome.as_ref().and_then(|o| o.reference.as_deref())
  }
}
