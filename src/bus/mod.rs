//! Message transport.
//!
//! # Data Flow
//! ```text
//! Publisher (HTTP bridge, tests, CLI)
//!     → local.rs (subject → queue group → one member)
//!     → Subscription (per-processor receive queue)
//!     → processor dispatch
//!     → message.rs ReplyHandle (reply or `{}` on drop)
//!     → requester
//! ```
//!
//! # Design Decisions
//! - Every delivered message gets exactly one reply
//! - Queue groups spread load across replicas of one processor
//! - In-flight invocations are counted so shutdown can drain them

pub mod inflight;
pub mod local;
pub mod message;

pub use inflight::{InFlightGuard, InFlightTracker};
pub use local::{Bus, BusError, Subscription};
pub use message::{Message, ReplyHandle};
