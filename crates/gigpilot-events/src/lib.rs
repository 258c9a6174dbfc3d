//! `gigpilot-events` — synchronous publish/subscribe for scheduler
//! notifications.
//!
//! Dashboards and CLIs subscribe to lifecycle and per-job events; the
//! scheduler is the only publisher. Handlers run in subscription order and
//! failures are isolated per handler.

pub mod bus;
pub mod types;

pub use bus::EventBus;
pub use types::{Event, EventFilter, EventHandler, EventKind};
