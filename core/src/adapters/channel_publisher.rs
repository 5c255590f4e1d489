// core/src/adapters/channel_publisher.rs

use crate::ports::{DomainEvent, EventPublisher, PublishError};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Publishes domain events onto a bounded in-process queue.
///
/// Never waits: a full or closed queue is reported as a publish error.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
  sender: mpsc::Sender<DomainEvent>,
}

impl ChannelPublisher {
  pub fn new(capacity: usize) -> (Self, mpsc::Receiver<DomainEvent>) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (Self { sender }, receiver)
  }
}

#[async_trait]
impl EventPublisher for ChannelPublisher {
  async fn publish(&self, event: DomainEvent) -> Result<(), PublishError> {
    let topic = event.topic().to_string();
    self.sender.try_send(event).map_err(|e| PublishError {
      topic,
      reason: e.to_string(),
    })
  }
}
