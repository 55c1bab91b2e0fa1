//! Candidate health state machine.
//!
//! # States
//! - Healthy: candidate receives traffic
//! - Unhealthy: candidate excluded from selection
//!
//! # State Transitions
//! ```text
//! Healthy → Unhealthy: explicit failure report for this path
//! Unhealthy → Healthy: now - last failure > cooldown, checked at selection time
//! ```
//!
//! # Design Decisions
//! - No background timer; recovery is evaluated lazily by the selector
//! - A repeated failure re-stamps the failure time
//! - State changes logged for observability

use std::time::{Duration, Instant};

/// Health of a single candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Healthy,
    /// Demoted at `since`.
    Unhealthy { since: Instant },
}

/// One outbound route a request may be dispatched to.
#[derive(Debug, Clone)]
pub struct Candidate {
    path: String,
    state: HealthState,
}

impl Candidate {
    /// Create a healthy candidate.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            state: HealthState::Healthy,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn state(&self) -> HealthState {
        self.state
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self.state, HealthState::Healthy)
    }

    /// Time of the most recent failure, while unhealthy.
    pub fn last_failure(&self) -> Option<Instant> {
        match self.state {
            HealthState::Healthy => None,
            HealthState::Unhealthy { since } => Some(since),
        }
    }

    /// Demote the candidate. Returns true on a Healthy → Unhealthy transition.
    pub fn mark_failure(&mut self, now: Instant) -> bool {
        let was_healthy = self.is_healthy();
        self.state = HealthState::Unhealthy { since: now };
        was_healthy
    }

    /// Restore the candidate once the cooldown has elapsed.
    /// Returns true on an Unhealthy → Healthy transition.
    pub fn try_recover(&mut self, now: Instant, cooldown: Duration) -> bool {
        match self.state {
            HealthState::Unhealthy { since } if now.saturating_duration_since(since) > cooldown => {
                self.state = HealthState::Healthy;
                true
            }
            _ => false,
        }
    }
}
