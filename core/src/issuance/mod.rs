// core/src/issuance/mod.rs

//! Ticket issuance and gate check-in.
//!
//! Tickets are minted inside the fulfillment transaction by the pure
//! [`mint_tickets`] function. Each carries a payload signed with a shared
//! HMAC secret so a gate can reject forged or altered tickets before it
//! touches the store.

pub mod check_in;
pub mod codes;
pub mod minting;
pub mod signing;

pub use check_in::{CheckInOutcome, CheckInService, CheckInStatus};
pub use codes::ticket_code;
pub use minting::mint_tickets;
pub use signing::{TicketClaims, TicketSigner};
