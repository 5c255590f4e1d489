// service/src/errors.rs

use thiserror::Error;
use ticketing_core::{ErrorKind, TicketingError};

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Ticketing Error: {source}")]
  Ticketing {
    #[from]
    source: TicketingError,
  },

  #[error("Email Error: {0}")]
  Email(String),

  #[error("I/O Error: {0}")]
  Io(#[from] std::io::Error),
}

pub fn status_for(kind: ErrorKind) -> u16 {
  match kind {
    ErrorKind::NotFound => 404,
    ErrorKind::BadRequest => 400,
    ErrorKind::Conflict => 409,
    ErrorKind::Gone => 410,
    ErrorKind::PaymentDeclined => 402,
    ErrorKind::Unavailable => 503,
    ErrorKind::Internal => 500,
  }
}

impl AppError {
  /// HTTP-style status for callers that report over a transport.
  pub fn status_code(&self) -> u16 {
    match self {
      AppError::Ticketing { source } => status_for(source.kind()),
      AppError::Sqlx(sqlx::Error::PoolTimedOut) => 503,
      _ => 500,
    }
  }

  pub fn is_retryable(&self) -> bool {
    match self {
      AppError::Ticketing { source } => source.is_retryable(),
      other => other.status_code() == 503,
    }
  }
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;
