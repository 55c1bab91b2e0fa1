//! Health tracking subsystem.
//!
//! # Data Flow
//! ```text
//! Passive outcome reports (load_balancer::pool):
//!     Response envelope with non-success status
//!     → Mark the matching candidate unhealthy, stamp failure time
//!
//! Lazy recovery (load_balancer::pool):
//!     Every selection
//!     → Unhealthy candidates past the cooldown return to Healthy
//!
//! State machine (state.rs):
//!     Healthy ←→ Unhealthy
//! ```
//!
//! # Design Decisions
//! - Health is driven only by observed outcomes, there are no active health checks
//! - Health state is per-candidate, not per-pool
//! - Candidates that are never selected never recover

pub mod state;

pub use state::{Candidate, HealthState};
