// core/src/adapters/mod.rs

//! In-process implementations of the ports, used by tests, benchmarks and
//! single-node deployments.

pub mod broadcast_notifier;
pub mod channel_publisher;
pub mod memory_store;
pub mod static_catalog;

pub use broadcast_notifier::BroadcastNotifier;
pub use channel_publisher::ChannelPublisher;
pub use memory_store::MemoryStore;
pub use static_catalog::StaticCatalog;
