// core/src/adapters/broadcast_notifier.rs

use crate::ports::{LiveNotifier, LiveUpdate, NotifyError};
use tokio::sync::broadcast;
use tracing::debug;

/// Fans live updates out to every subscriber. Slow subscribers lag and lose
/// the oldest updates rather than slowing down the sender.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
  sender: broadcast::Sender<LiveUpdate>,
}

impl BroadcastNotifier {
  pub fn new(capacity: usize) -> Self {
    let (sender, _) = broadcast::channel(capacity.max(1));
    Self { sender }
  }

  pub fn subscribe(&self) -> broadcast::Receiver<LiveUpdate> {
    self.sender.subscribe()
  }
}

impl LiveNotifier for BroadcastNotifier {
  fn push(&self, update: LiveUpdate) -> Result<(), NotifyError> {
    if self.sender.receiver_count() == 0 {
      debug!(?update, "No live subscribers; update not delivered.");
      return Ok(());
    }
    self
      .sender
      .send(update)
      .map(|_| ())
      .map_err(|e| NotifyError(e.to_string()))
  }
}
