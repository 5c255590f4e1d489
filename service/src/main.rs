// service/src/main.rs

mod config;
mod db;
mod errors;
mod gate;
mod models;
mod seed;
mod services;
mod state;

use crate::config::AppConfig;
use crate::state::AppState;

use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use ticketing_core::adapters::ChannelPublisher;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan; // For span events in tracing

const BUS_CAPACITY: usize = 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO) // Default level
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // Allow RUST_LOG override
    .with_span_events(FmtSpan::CLOSE) // Log when spans close, showing duration
    .init();

  tracing::info!("Starting ticketing service...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(e.into());
    }
  };
  tracing::debug!(config = ?app_config, "Loaded config details");

  let db_pool = match PgPoolOptions::new().max_connections(16).connect(&app_config.database_url).await {
    Ok(pool) => {
      tracing::info!("Successfully connected to the database.");
      pool
    }
    Err(e) => {
      tracing::error!(error = %e, "Failed to connect to the database.");
      return Err(e.into());
    }
  };
  db::migrate(&db_pool).await?;

  let (publisher, bus) = ChannelPublisher::new(BUS_CAPACITY);
  let mailer = tokio::spawn(services::notifications::run_mailer(bus, app_config.mail_sender.clone()));

  let app_state = AppState::build(db_pool.clone(), app_config.clone(), publisher)?;
  let relay = tokio::spawn(services::notifications::relay_live_updates(app_state.notifier.subscribe()));

  if app_state.config.seed_db {
    if let Err(e) = seed::seed_db(&app_state).await {
      tracing::error!(error = %e, status = e.status_code(), retryable = e.is_retryable(), "Failed to seed database.");
    }
  }

  if app_state.config.gate_enabled {
    gate::run_gate(&app_state.gate).await?;
  } else {
    tracing::info!("Ticketing core ready. Press Ctrl-C to stop.");
    tokio::signal::ctrl_c().await?;
  }

  tracing::info!("Shutting down.");
  relay.abort();
  // Dropping the services closes the bus so the mailer drains and exits.
  drop(app_state);
  if let Err(e) = mailer.await {
    tracing::warn!(error = %e, "Mailer task ended abnormally.");
  }
  db_pool.close().await;
  Ok(())
}
