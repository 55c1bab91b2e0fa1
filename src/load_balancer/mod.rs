//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Request envelope for the ingress path
//!     → pool.rs (lazy recovery of cooled-down candidates)
//!     → pool.rs (collect healthy candidates)
//!     → Apply load balancing algorithm:
//!         - random.rs (uniform pick)
//!     → Return candidate path or NoHealthyCandidate
//!
//! Response envelope with a status code
//!     → pool.rs (demote the candidate on non-success)
//! ```
//!
//! # Design Decisions
//! - Load balancer is stateless; the pool owns health state
//! - One coarse lock over the whole (small, fixed) candidate set
//! - Unhealthy candidates excluded from selection
//! - No weighting, least-connections or stickiness

pub mod pool;
pub mod random;

use std::fmt::Debug;

use crate::health::Candidate;

/// Strategy choosing one candidate among the currently healthy ones.
pub trait LoadBalancer: Send + Sync + Debug {
    /// Returns `None` only when `healthy` is empty.
    fn next_candidate<'a>(&self, healthy: &[&'a Candidate]) -> Option<&'a Candidate>;
}

pub use pool::{CandidatePool, CandidateStatus, RouteError};
pub use random::UniformRandom;
