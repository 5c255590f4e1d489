// src/lib.rs

//! Ticketing inventory core: sells a fixed stock of event tickets without
//! ever overselling.
//!
//! The crate is built from a handful of explicit services:
//!  - [`StockLedger`]: ticket types of an event and how many are sold.
//!  - [`ReservationManager`]: per-owner carts holding stock for a limited time.
//!  - [`FulfillmentService`]: checkout (payment, then one atomic ledger commit) and refunds.
//!  - [`CheckInService`]: signed ticket validation at the gate.
//!
//! Storage, payments, the message bus and the live channel are reached
//! through the traits in [`ports`]. In-process implementations live in
//! [`adapters`].

pub mod adapters;
pub mod clock;
pub mod error;
pub mod fulfillment;
pub mod issuance;
pub mod ledger;
pub mod models;
pub mod ports;
pub mod reservation;
pub mod settings;
pub mod workflow;

mod live;
mod transaction;

// --- Re-exports for the Public API ---

pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::error::{ErrorKind, Result, StoreError, StoreResult, TicketingError};
pub use crate::fulfillment::{FulfillmentDeps, FulfillmentService};
pub use crate::issuance::{mint_tickets, CheckInOutcome, CheckInService, CheckInStatus, TicketSigner};
pub use crate::ledger::StockLedger;
pub use crate::reservation::ReservationManager;
pub use crate::settings::CoreSettings;
