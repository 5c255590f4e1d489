// service/src/gate.rs

//! Line-oriented gate scanner: one signed payload per stdin line, one JSON
//! verdict per stdout line.

use crate::errors::{status_for, Result as AppResult};
use serde_json::{json, Value};
use ticketing_core::{CheckInOutcome, CheckInService, TicketingError};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

pub fn verdict(result: &Result<CheckInOutcome, TicketingError>) -> Value {
  match result {
    Ok(outcome) => json!({
      "admitted": true,
      "status": outcome.status,
      "code": outcome.ticket.code,
      "holder": outcome.ticket.holder_name,
      "check_in_at": outcome.ticket.check_in_at,
      "message": outcome.message,
    }),
    Err(e) => json!({
      "admitted": false,
      "status": status_for(e.kind()),
      "error": e.to_string(),
      "retryable": e.is_retryable(),
    }),
  }
}

pub async fn run_gate(gate: &CheckInService) -> AppResult<()> {
  info!("Gate ready; reading signed payloads from stdin.");
  let mut lines = BufReader::new(tokio::io::stdin()).lines();
  let mut stdout = tokio::io::stdout();
  while let Some(line) = lines.next_line().await? {
    let presented = line.trim();
    if presented.is_empty() {
      continue;
    }
    let result = gate.check_in(presented).await;
    if let Err(e) = &result {
      warn!(error = %e, "Entry refused.");
    }
    let mut out = verdict(&result).to_string();
    out.push('\n');
    stdout.write_all(out.as_bytes()).await?;
    stdout.flush().await?;
  }
  info!("Gate input closed.");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn refused_entries_carry_status_and_retry_hint() {
    let gone = verdict(&Err(TicketingError::Gone("Ticket 'TKT-1' has been cancelled.".into())));
    assert_eq!(gone["admitted"], false);
    assert_eq!(gone["status"], 410);
    assert_eq!(gone["retryable"], false);

    let busy = verdict(&Err(TicketingError::Unavailable("check_in timed out".into())));
    assert_eq!(busy["status"], 503);
    assert_eq!(busy["retryable"], true);
  }
}
