// core/src/settings.rs

use chrono::Duration;
use std::fmt;
use std::time::Duration as StdDuration;

/// Tunables shared by the core services.
#[derive(Clone)]
pub struct CoreSettings {
  /// How long a cart holds its items after being created or reset.
  pub cart_ttl: Duration,
  /// Upper bound for any single store transaction, lease waits included.
  pub transaction_timeout: StdDuration,
  /// A stock update with `0 < available <= low_stock_threshold` also raises a low-stock alert.
  pub low_stock_threshold: u32,
  /// Shared HMAC secret for ticket payload signatures.
  pub signing_secret: Vec<u8>,
}

impl CoreSettings {
  pub const DEFAULT_CART_TTL_MINUTES: i64 = 15;
  pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 10;
  pub const DEFAULT_TRANSACTION_TIMEOUT_MS: u64 = 5_000;

  pub fn new(signing_secret: impl Into<Vec<u8>>) -> Self {
    Self {
      cart_ttl: Duration::minutes(Self::DEFAULT_CART_TTL_MINUTES),
      transaction_timeout: StdDuration::from_millis(Self::DEFAULT_TRANSACTION_TIMEOUT_MS),
      low_stock_threshold: Self::DEFAULT_LOW_STOCK_THRESHOLD,
      signing_secret: signing_secret.into(),
    }
  }

  pub fn with_cart_ttl(mut self, cart_ttl: Duration) -> Self {
    self.cart_ttl = cart_ttl;
    self
  }

  pub fn with_transaction_timeout(mut self, timeout: StdDuration) -> Self {
    self.transaction_timeout = timeout;
    self
  }

  pub fn with_low_stock_threshold(mut self, threshold: u32) -> Self {
    self.low_stock_threshold = threshold;
    self
  }
}

impl fmt::Debug for CoreSettings {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CoreSettings")
      .field("cart_ttl", &self.cart_ttl)
      .field("transaction_timeout", &self.transaction_timeout)
      .field("low_stock_threshold", &self.low_stock_threshold)
      .field("signing_secret", &"[REDACTED]")
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn debug_output_hides_the_signing_secret() {
    let settings = CoreSettings::new("hunter2-signing-key");
    let printed = format!("{:?}", settings);
    assert!(!printed.contains("hunter2"));
    assert!(!printed.contains(&format!("{:?}", b"hunter2-signing-key".to_vec())));
    assert!(printed.contains("[REDACTED]"));
    assert!(printed.contains("low_stock_threshold: 10"));
  }
}
