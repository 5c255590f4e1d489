// core/src/ledger.rs

//! The stock ledger: ticket types of each event and their sold counts.
//!
//! `sold_count` only moves inside fulfillment and refund transactions. This
//! service manages everything else about a ticket type.

use crate::clock::Clock;
use crate::error::{Result, TicketingError};
use crate::live::push_stock_level;
use crate::models::{NewStockUnit, StockStatus, StockUnit, StockUnitChanges};
use crate::ports::{EventCatalog, LiveNotifier, TicketingStore};
use crate::settings::CoreSettings;
use crate::transaction::within_deadline;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

pub struct StockLedger {
  store: Arc<dyn TicketingStore>,
  catalog: Arc<dyn EventCatalog>,
  clock: Arc<dyn Clock>,
  notifier: Arc<dyn LiveNotifier>,
  settings: CoreSettings,
}

impl StockLedger {
  pub fn new(
    store: Arc<dyn TicketingStore>,
    catalog: Arc<dyn EventCatalog>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn LiveNotifier>,
    settings: CoreSettings,
  ) -> Self {
    Self {
      store,
      catalog,
      clock,
      notifier,
      settings,
    }
  }

  #[instrument(name = "ledger_register", skip(self, new_unit), fields(event = %new_unit.event_ref, name = %new_unit.name))]
  pub async fn register(&self, new_unit: NewStockUnit) -> Result<StockUnit> {
    if !self.catalog.event_exists(new_unit.event_ref).await? {
      return Err(TicketingError::NotFound(format!(
        "Event {} does not exist.",
        new_unit.event_ref
      )));
    }

    let unit = new_unit.into_stock_unit(Uuid::new_v4());
    unit.validate()?;

    within_deadline(self.settings.transaction_timeout, "ledger_register", async {
      let mut tx = self.store.begin().await?;
      tx.insert_stock_unit(&unit).await?;
      tx.commit().await?;
      Ok(())
    })
    .await?;

    info!(stock_unit = %unit.id, total = unit.total_quantity, "Ticket type registered.");
    Ok(unit)
  }

  /// Applies `changes`. The total can never drop below what is already sold.
  #[instrument(name = "ledger_revise", skip(self, changes))]
  pub async fn revise(&self, id: Uuid, changes: StockUnitChanges) -> Result<StockUnit> {
    let now = self.clock.now();
    let (unit, available) = within_deadline(self.settings.transaction_timeout, "ledger_revise", async {
      let mut tx = self.store.begin().await?;
      let mut unit = tx
        .lock_stock_units(&[id])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| not_found(id))?;

      changes.apply_to(&mut unit);
      unit.validate()?;

      tx.update_stock_unit(&unit).await?;
      let reserved = tx.reserved_quantity(id, now).await?;
      tx.commit().await?;
      let available = unit.available_after_holds(reserved);
      Ok((unit, available))
    })
    .await?;

    info!(stock_unit = %id, total = unit.total_quantity, sold = unit.sold_count, "Ticket type revised.");
    push_stock_level(self.notifier.as_ref(), self.settings.low_stock_threshold, &unit, available);
    Ok(unit)
  }

  /// Deletes a ticket type that has never sold and is not held by any active cart.
  #[instrument(name = "ledger_remove", skip(self))]
  pub async fn remove(&self, id: Uuid) -> Result<()> {
    let now = self.clock.now();
    within_deadline(self.settings.transaction_timeout, "ledger_remove", async {
      let mut tx = self.store.begin().await?;
      let unit = tx
        .lock_stock_units(&[id])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| not_found(id))?;

      if unit.sold_count > 0 {
        return Err(TicketingError::Conflict(format!(
          "Ticket type '{}' has {} sold tickets and cannot be deleted.",
          unit.name, unit.sold_count
        )));
      }
      let reserved = tx.reserved_quantity(id, now).await?;
      if reserved > 0 {
        return Err(TicketingError::Conflict(format!(
          "Ticket type '{}' is held in {} cart slot(s) and cannot be deleted.",
          unit.name, reserved
        )));
      }

      tx.delete_stock_unit(id).await?;
      tx.commit().await?;
      Ok(())
    })
    .await?;

    info!(stock_unit = %id, "Ticket type removed.");
    Ok(())
  }

  pub async fn get(&self, id: Uuid) -> Result<StockUnit> {
    within_deadline(self.settings.transaction_timeout, "ledger_get", async {
      let mut tx = self.store.begin().await?;
      let unit = tx.find_stock_unit(id).await?;
      tx.rollback().await?;
      unit.ok_or_else(|| not_found(id))
    })
    .await
  }

  pub async fn list_for_event(&self, event_ref: Uuid) -> Result<Vec<StockUnit>> {
    within_deadline(self.settings.transaction_timeout, "ledger_list", async {
      let mut tx = self.store.begin().await?;
      let units = tx.list_stock_units(event_ref).await?;
      tx.rollback().await?;
      Ok(units)
    })
    .await
  }

  pub async fn stock_status(&self, id: Uuid) -> Result<StockStatus> {
    let unit = self.get(id).await?;
    Ok(StockStatus::from(&unit))
  }
}

fn not_found(id: Uuid) -> TicketingError {
  TicketingError::NotFound(format!("Ticket type {} does not exist.", id))
}
