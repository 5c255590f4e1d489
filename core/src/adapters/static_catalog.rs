// core/src/adapters/static_catalog.rs

use crate::error::StoreResult;
use crate::ports::EventCatalog;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashSet;
use uuid::Uuid;

/// An event catalog backed by a fixed set of event ids.
#[derive(Debug, Default)]
pub struct StaticCatalog {
  events: RwLock<HashSet<Uuid>>,
}

impl StaticCatalog {
  pub fn new(events: impl IntoIterator<Item = Uuid>) -> Self {
    Self {
      events: RwLock::new(events.into_iter().collect()),
    }
  }

  pub fn add_event(&self, event_ref: Uuid) {
    self.events.write().insert(event_ref);
  }
}

#[async_trait]
impl EventCatalog for StaticCatalog {
  async fn event_exists(&self, event_ref: Uuid) -> StoreResult<bool> {
    Ok(self.events.read().contains(&event_ref))
  }
}
