// core/src/ports/mod.rs

//! Collaborator boundaries. The core talks to storage, payments, the event
//! catalog, the message bus and the live channel only through these traits.

pub mod catalog;
pub mod notifier;
pub mod payment;
pub mod publisher;
pub mod store;

pub use catalog::EventCatalog;
pub use notifier::{LiveNotifier, LiveUpdate, NotifyError};
pub use payment::{PaymentGateway, PaymentGatewayError, PaymentOutcome};
pub use publisher::{DomainEvent, EventPublisher, PublishError, PurchasedLine};
pub use store::{StoreTx, TicketingStore};
