// service/src/services/payment_mock.rs

use async_trait::async_trait;
use std::time::Duration;
use ticketing_core::models::Money;
use ticketing_core::ports::{PaymentGateway, PaymentGatewayError, PaymentOutcome};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Stand-in for the card processor. Method references starting with `fail`
/// are declined, `offline` simulates an unreachable processor and `slow` one
/// that never answers.
#[derive(Debug, Clone)]
pub struct MockPaymentGateway {
  latency: Duration,
}

impl MockPaymentGateway {
  pub fn new(latency: Duration) -> Self {
    Self { latency }
  }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
  #[instrument(name = "mock_payment", skip(self, amount), fields(amount = %amount))]
  async fn process_payment(&self, method_ref: &str, amount: &Money) -> Result<PaymentOutcome, PaymentGatewayError> {
    info!("Simulating charge with method '{}'", method_ref);
    tokio::time::sleep(self.latency).await; // Simulate network latency

    if method_ref.starts_with("offline") {
      warn!("Mock processor unreachable for method '{}'", method_ref);
      return Err(PaymentGatewayError::Transport("mock processor offline".to_string()));
    }
    if method_ref.starts_with("slow") {
      warn!("Mock processor did not answer for method '{}'", method_ref);
      return Err(PaymentGatewayError::Timeout);
    }
    if amount.amount_cents < 0 {
      return Ok(PaymentOutcome::declined("Amount must not be negative"));
    }
    if method_ref.starts_with("fail") {
      info!("Mock payment DECLINED for method '{}'", method_ref);
      return Ok(PaymentOutcome::declined("Card declined by issuer"));
    }

    let reference = format!("mock_pi_{}", Uuid::new_v4());
    info!("Mock payment SUCCEEDED with reference {}", reference);
    Ok(PaymentOutcome::approved(reference))
  }
}
