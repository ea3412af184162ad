//! Core types for agenda.
//!
//! This crate holds everything that does not talk to a specific service:
//! - `event`, `color` and `store` for the local event model and its files
//! - `identity` for deciding which file a session reads and writes
//! - `remote` for the calendar contract providers implement
//! - `sync` for pull/push reconciliation
//! - `advisor` for natural-language scheduling

pub mod advisor;
pub mod color;
pub mod config;
pub mod credentials;
pub mod error;
pub mod event;
pub mod identity;
pub mod remote;
pub mod store;
pub mod sync;

pub use error::{AgendaError, AgendaResult};
pub use event::{Event, EventDraft, EventId};
pub use identity::PartitionKey;
pub use sync::Ledger;
