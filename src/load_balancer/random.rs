//! Uniform random load balancing strategy.

use crate::health::Candidate;
use crate::load_balancer::LoadBalancer;

/// Uniform random selector.
/// Every healthy candidate is equally likely on each call.
#[derive(Debug, Default)]
pub struct UniformRandom;

impl UniformRandom {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for UniformRandom {
    fn next_candidate<'a>(&self, healthy: &[&'a Candidate]) -> Option<&'a Candidate> {
        if healthy.is_empty() {
            return None;
        }
        Some(healthy[fastrand::usize(..healthy.len())])
    }
}
