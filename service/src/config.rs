// service/src/config.rs

use crate::errors::{AppError, Result};
use chrono::Duration;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration as StdDuration;
use ticketing_core::CoreSettings;

#[derive(Clone)]
pub struct AppConfig {
  pub database_url: String,
  pub ticket_signing_secret: String,

  pub cart_ttl_seconds: i64,
  pub tx_timeout_ms: u64,
  pub low_stock_threshold: u32,

  // Mock collaborators
  pub payment_latency_ms: u64,
  pub mail_sender: String,

  pub seed_db: bool,
  /// Read signed payloads from stdin and check them in.
  pub gate_enabled: bool,
}

// Keeps the database URL and the signing secret out of logs.
impl std::fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AppConfig")
      .field("database_url", &"[REDACTED]")
      .field("ticket_signing_secret", &"[REDACTED]")
      .field("cart_ttl_seconds", &self.cart_ttl_seconds)
      .field("tx_timeout_ms", &self.tx_timeout_ms)
      .field("low_stock_threshold", &self.low_stock_threshold)
      .field("payment_latency_ms", &self.payment_latency_ms)
      .field("mail_sender", &self.mail_sender)
      .field("seed_db", &self.seed_db)
      .field("gate_enabled", &self.gate_enabled)
      .finish()
  }
}

fn parse_or<T>(name: &str, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match env::var(name) {
    Ok(raw) => raw
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", name, raw, e))),
    Err(_) => Ok(default),
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };

    let database_url = get_env("DATABASE_URL")?;
    let ticket_signing_secret = get_env("TICKET_SIGNING_SECRET")?;
    if ticket_signing_secret.trim().is_empty() {
      return Err(AppError::Config("TICKET_SIGNING_SECRET must not be empty".to_string()));
    }

    let cart_ttl_seconds = parse_or("CART_TTL_SECONDS", CoreSettings::DEFAULT_CART_TTL_MINUTES * 60)?;
    if cart_ttl_seconds <= 0 {
      return Err(AppError::Config(format!("CART_TTL_SECONDS must be positive, got {}", cart_ttl_seconds)));
    }
    let tx_timeout_ms = parse_or("TX_TIMEOUT_MS", CoreSettings::DEFAULT_TRANSACTION_TIMEOUT_MS)?;
    let low_stock_threshold = parse_or("LOW_STOCK_THRESHOLD", CoreSettings::DEFAULT_LOW_STOCK_THRESHOLD)?;
    let payment_latency_ms = parse_or("MOCK_PAYMENT_LATENCY_MS", 50u64)?;
    let mail_sender = get_env("MAIL_SENDER").unwrap_or_else(|_| "tickets@example.com".to_string());
    let seed_db = parse_or("SEED_DB", false)?;
    let gate_enabled = parse_or("GATE_ENABLED", false)?;

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      database_url,
      ticket_signing_secret,
      cart_ttl_seconds,
      tx_timeout_ms,
      low_stock_threshold,
      payment_latency_ms,
      mail_sender,
      seed_db,
      gate_enabled,
    })
  }

  pub fn core_settings(&self) -> CoreSettings {
    CoreSettings::new(self.ticket_signing_secret.as_bytes())
      .with_cart_ttl(Duration::seconds(self.cart_ttl_seconds))
      .with_transaction_timeout(StdDuration::from_millis(self.tx_timeout_ms))
      .with_low_stock_threshold(self.low_stock_threshold)
  }
}
