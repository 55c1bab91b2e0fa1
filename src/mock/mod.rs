//! Record/replay subsystem.
//!
//! # Data Flow
//! ```text
//! Genuine upstream response (any path but the mock path)
//!     → store.rs (capture payload, headers, status under the route path)
//!
//! Short-circuited response on the mock path
//!     → store.rs (longest-prefix lookup of the requested target)
//!     → latency.rs (optional exponential delay)
//!     → replayed fragments
//! ```
//!
//! # Design Decisions
//! - Process-lifetime cache, no TTL, no persistence
//! - Whole-entry overwrite per key, never a merge
//! - Longest matching prefix wins so lookups are deterministic

pub mod latency;
pub mod store;

pub use latency::LatencySimulator;
pub use store::{MockStore, RecordedResponse};
