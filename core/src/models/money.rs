// core/src/models/money.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// An amount in integer minor units (cents) of an ISO-4217 currency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
  pub amount_cents: i64,
  pub currency: String,
}

impl Money {
  pub fn new(amount_cents: i64, currency: impl Into<String>) -> Self {
    Self {
      amount_cents,
      currency: currency.into(),
    }
  }

  pub fn zero(currency: impl Into<String>) -> Self {
    Self::new(0, currency)
  }

  /// `self × quantity`, or `None` on overflow.
  pub fn times(&self, quantity: u32) -> Option<Money> {
    self
      .amount_cents
      .checked_mul(i64::from(quantity))
      .map(|amount_cents| Money::new(amount_cents, self.currency.clone()))
  }

  /// Sum of two amounts, or `None` on overflow or currency mismatch.
  pub fn checked_add(&self, other: &Money) -> Option<Money> {
    if self.currency != other.currency {
      return None;
    }
    self
      .amount_cents
      .checked_add(other.amount_cents)
      .map(|amount_cents| Money::new(amount_cents, self.currency.clone()))
  }

  pub fn is_valid_currency(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase())
  }
}

impl fmt::Display for Money {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let sign = if self.amount_cents < 0 { "-" } else { "" };
    let abs = self.amount_cents.unsigned_abs();
    write!(f, "{} {}{}.{:02}", self.currency, sign, abs / 100, abs % 100)
  }
}
