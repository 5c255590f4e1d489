// core/src/ports/catalog.rs

use crate::error::StoreResult;
use async_trait::async_trait;
use uuid::Uuid;

/// Read-only view of the events owned by the catalog service.
#[async_trait]
pub trait EventCatalog: Send + Sync {
  async fn event_exists(&self, event_ref: Uuid) -> StoreResult<bool>;
}
