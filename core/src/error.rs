// core/src/error.rs

//! Error taxonomy of the ticketing core.
//!
//! Every public operation returns one of these kinds or succeeds. Callers map
//! [`ErrorKind`] to their transport (HTTP status, gRPC code, exit code).

use crate::workflow::WorkflowError;
use thiserror::Error;

/// Failures reported by a [`crate::ports::TicketingStore`] adapter.
#[derive(Debug, Error)]
pub enum StoreError {
  /// A uniqueness constraint was violated (owner cart, order code, ticket code, cart line).
  #[error("Unique constraint violated: {0}")]
  UniqueViolation(String),

  /// A row would break a stored invariant such as `sold_count <= total_quantity`.
  #[error("Check constraint violated: {0}")]
  CheckViolation(String),

  /// Lock wait timeout, serialization failure or deadlock. Safe to retry.
  #[error("Store contention: {0}")]
  Contention(String),

  /// A stored row could not be mapped back into a domain value.
  #[error("Corrupt row: {0}")]
  Corrupt(String),

  #[error("Store backend error: {source}")]
  Backend {
    #[source]
    source: anyhow::Error,
  },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum TicketingError {
  #[error("Not found: {0}")]
  NotFound(String),

  #[error("Bad request: {0}")]
  BadRequest(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Gone: {0}")]
  Gone(String),

  /// The gateway answered and refused the charge. Distinct from `BadRequest`
  /// so callers can offer a retry with another payment method.
  #[error("Payment declined: {0}")]
  PaymentDeclined(String),

  /// Transaction timeout, store contention or unreachable collaborator.
  /// Nothing was persisted; the caller may retry.
  #[error("Temporarily unavailable: {0}")]
  Unavailable(String),

  #[error("Store error: {source}")]
  Store {
    #[from]
    source: StoreError,
  },

  #[error("Workflow error: {source}")]
  Workflow {
    #[from]
    source: WorkflowError,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  NotFound,
  BadRequest,
  Conflict,
  Gone,
  PaymentDeclined,
  Unavailable,
  Internal,
}

impl TicketingError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      TicketingError::NotFound(_) => ErrorKind::NotFound,
      TicketingError::BadRequest(_) => ErrorKind::BadRequest,
      TicketingError::Conflict(_) => ErrorKind::Conflict,
      TicketingError::Gone(_) => ErrorKind::Gone,
      TicketingError::PaymentDeclined(_) => ErrorKind::PaymentDeclined,
      TicketingError::Unavailable(_) => ErrorKind::Unavailable,
      TicketingError::Store {
        source: StoreError::Contention(_),
      } => ErrorKind::Unavailable,
      TicketingError::Store {
        source: StoreError::CheckViolation(_),
      } => ErrorKind::Conflict,
      TicketingError::Store { .. } | TicketingError::Workflow { .. } => ErrorKind::Internal,
    }
  }

  /// Transient failure: repeating the same call may succeed.
  pub fn is_retryable(&self) -> bool {
    self.kind() == ErrorKind::Unavailable
  }
}

pub type Result<T, E = TicketingError> = std::result::Result<T, E>;
