// core/src/live.rs

use crate::models::StockUnit;
use crate::ports::{LiveNotifier, LiveUpdate};
use tracing::warn;

/// Pushes a stock level, plus a low-stock alert when `0 < available <= threshold`.
/// Failures are logged and otherwise ignored.
pub(crate) fn push_stock_level(notifier: &dyn LiveNotifier, low_stock_threshold: u32, unit: &StockUnit, available: u32) {
  let update = LiveUpdate::StockUpdated {
    event_ref: unit.event_ref,
    stock_unit_ref: unit.id,
    available,
  };
  if let Err(e) = notifier.push(update) {
    warn!(stock_unit = %unit.id, error = %e, "Stock update push failed.");
  }

  if available > 0 && available <= low_stock_threshold {
    let alert = LiveUpdate::LowStock {
      event_ref: unit.event_ref,
      stock_unit_ref: unit.id,
      available,
    };
    if let Err(e) = notifier.push(alert) {
      warn!(stock_unit = %unit.id, error = %e, "Low-stock alert push failed.");
    }
  }
}

pub(crate) fn push(notifier: &dyn LiveNotifier, update: LiveUpdate) {
  if let Err(e) = notifier.push(update) {
    warn!(error = %e, "Live update push failed.");
  }
}
