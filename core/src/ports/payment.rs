// core/src/ports/payment.rs

use crate::models::Money;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The gateway's answer to a charge request. A decline is an answer, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOutcome {
  pub success: bool,
  pub reference: Option<String>,
  pub message: String,
}

impl PaymentOutcome {
  pub fn approved(reference: impl Into<String>) -> Self {
    Self {
      success: true,
      reference: Some(reference.into()),
      message: "Payment approved".to_string(),
    }
  }

  pub fn declined(message: impl Into<String>) -> Self {
    Self {
      success: false,
      reference: None,
      message: message.into(),
    }
  }
}

/// The gateway could not be reached or did not answer in time.
#[derive(Debug, Error)]
pub enum PaymentGatewayError {
  #[error("Payment gateway unreachable: {0}")]
  Transport(String),
  #[error("Payment gateway timed out")]
  Timeout,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  async fn process_payment(&self, method_ref: &str, amount: &Money) -> Result<PaymentOutcome, PaymentGatewayError>;
}
