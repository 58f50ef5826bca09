//! The saint-of-the-day service worker.
//!
//! [`Worker`] routes install, activate, fetch, message and push events to
//! their handlers over an explicit [`context::WorkerContext`]; [`host`]
//! drives it over a JSON-lines stdio transport.

pub mod context;
pub mod error;
pub mod handlers;
pub mod host;
pub mod worker;

#[cfg(test)]
mod testing;

pub use context::{Ports, WorkerContext};
pub use error::HostError;
pub use handlers::{EventKind, EventOutcome, HandlerTable, WorkerEvent};
pub use worker::Worker;
