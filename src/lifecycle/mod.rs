//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Metrics → Bus → Processors subscribed → Listener bound → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Subscriptions stop → HTTP stops → Drain in-flight → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when processors are subscribed)
//! - Draining is bounded by the grace period; stragglers are abandoned

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{Processors, StartupError};
