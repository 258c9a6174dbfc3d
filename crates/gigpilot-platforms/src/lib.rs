//! `gigpilot-platforms` — the immutable platform catalog and per-platform
//! connection state.
//!
//! The registry is injected at scheduler construction so the set of
//! platforms is swappable for testing; the built-in table covers the
//! well-known micro-task platforms.

pub mod catalog;
pub mod connection;
pub mod error;
pub mod registry;

pub use catalog::{builtin_catalog, KnownPlatform, KNOWN_PLATFORMS};
pub use connection::{ConnectionStatus, PlatformConnection};
pub use error::PlatformError;
pub use registry::PlatformRegistry;
