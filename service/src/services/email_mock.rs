// service/src/services/email_mock.rs
use crate::errors::{AppError, Result as AppResult};
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
  pub to: String,
  pub subject: String,
  pub html_body: String,
}

#[derive(Debug)]
pub struct SentEmailInfo {
  pub to: String,
  pub message_id: String,
}

/// Pretends to hand the mail to a relay after a short delay.
#[instrument(name = "mock_email", skip(mail), fields(to = %mail.to))]
pub async fn send_mock_email(from: &str, mail: &OutgoingMail) -> AppResult<SentEmailInfo> {
  info!("Simulating mail from '{}': {}", from, mail.subject);
  tokio::time::sleep(std::time::Duration::from_millis(20)).await; // Simulate network latency

  if !mail.to.contains('@') {
    warn!("Refusing to mail invalid recipient '{}'", mail.to);
    return Err(AppError::Email(format!("Invalid recipient address '{}'", mail.to)));
  }

  let message_id = format!("mock_email_{}", uuid::Uuid::new_v4());
  let preview: String = mail.html_body.chars().take(50).collect();
  info!(%preview, "Mock email accepted as {}", message_id);
  Ok(SentEmailInfo {
    to: mail.to.clone(),
    message_id,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn rejects_recipients_without_at_sign() {
    let mail = OutgoingMail {
      to: "nobody".to_string(),
      subject: "Your tickets".to_string(),
      html_body: "<p>hi</p>".to_string(),
    };
    let err = send_mock_email("tickets@example.com", &mail).await.unwrap_err();
    assert!(matches!(err, AppError::Email(_)));
  }
}
