// core/src/transaction.rs

use crate::error::{Result, TicketingError};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Runs a transactional section under a deadline.
///
/// The section owns its `StoreTx`; when the deadline passes the future is
/// dropped, which drops the transaction and discards its writes.
pub(crate) async fn within_deadline<T, F>(limit: Duration, operation: &'static str, section: F) -> Result<T>
where
  F: Future<Output = Result<T>>,
{
  match tokio::time::timeout(limit, section).await {
    Ok(result) => result,
    Err(_) => {
      warn!(operation, timeout_ms = limit.as_millis() as u64, "Store transaction timed out; rolled back.");
      Err(TicketingError::Unavailable(format!(
        "{} did not complete within {} ms",
        operation,
        limit.as_millis()
      )))
    }
  }
}
