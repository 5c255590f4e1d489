// service/src/db/catalog.rs

use super::store_error;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use ticketing_core::ports::EventCatalog;
use ticketing_core::StoreResult;
use uuid::Uuid;

/// Reads the `events` table owned by the catalog side of the platform.
#[derive(Clone)]
pub struct PgEventCatalog {
  pool: PgPool,
}

impl PgEventCatalog {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  /// Used by seeding; events are otherwise created outside this service.
  pub async fn upsert_event(&self, id: Uuid, name: &str, starts_at: DateTime<Utc>) -> StoreResult<()> {
    sqlx::query("INSERT INTO events (id, name, starts_at) VALUES ($1, $2, $3) ON CONFLICT (id) DO NOTHING")
      .bind(id)
      .bind(name)
      .bind(starts_at)
      .execute(&self.pool)
      .await
      .map_err(store_error)?;
    Ok(())
  }

  pub async fn event_count(&self) -> StoreResult<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM events")
      .fetch_one(&self.pool)
      .await
      .map_err(store_error)
  }
}

#[async_trait]
impl EventCatalog for PgEventCatalog {
  async fn event_exists(&self, event_ref: Uuid) -> StoreResult<bool> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM events WHERE id = $1)")
      .bind(event_ref)
      .fetch_one(&self.pool)
      .await
      .map_err(store_error)
  }
}
