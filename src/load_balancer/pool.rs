//! Candidate pool management.
//!
//! # Responsibilities
//! - Own the fixed candidate set and its health state
//! - Apply lazy recovery and the load balancing algorithm on selection
//! - Demote candidates on non-success outcome reports

use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::config::BrokerConfig;
use crate::envelope::SUCCESS_STATUS;
use crate::health::Candidate;
use crate::load_balancer::{random::UniformRandom, LoadBalancer};
use crate::observability::metrics;

/// Selection failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("no healthy candidate available")]
    NoHealthyCandidate,
}

/// Point-in-time view of one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateStatus {
    pub path: String,
    pub healthy: bool,
    /// Seconds since the most recent failure, while unhealthy.
    pub secs_since_failure: Option<f64>,
}

/// The router's candidate set.
#[derive(Debug)]
pub struct CandidatePool {
    /// Coarse lock: recovery scan, selection and demotion are serialized.
    candidates: Mutex<Vec<Candidate>>,
    cooldown: Duration,
    balancer: Box<dyn LoadBalancer>,
}

impl CandidatePool {
    /// Create a pool with uniform random selection. Duplicate paths keep their first entry.
    pub fn new<I, S>(paths: I, cooldown: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_balancer(paths, cooldown, Box::new(UniformRandom::new()))
    }

    pub fn with_balancer<I, S>(paths: I, cooldown: Duration, balancer: Box<dyn LoadBalancer>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut candidates: Vec<Candidate> = Vec::new();
        for path in paths {
            let path = path.into();
            if candidates.iter().any(|c| c.path() == path) {
                tracing::warn!(path = %path, "Duplicate candidate ignored");
                continue;
            }
            metrics::record_candidate_health(&path, true);
            candidates.push(Candidate::new(path));
        }

        Self {
            candidates: Mutex::new(candidates),
            cooldown,
            balancer,
        }
    }

    /// Create a pool from the router configuration.
    pub fn from_config(config: &BrokerConfig) -> Self {
        Self::new(config.candidates.iter().cloned(), config.cooldown())
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Select a healthy candidate path.
    pub fn select(&self) -> Result<String, RouteError> {
        self.select_at(Instant::now())
    }

    /// Select as if the current time were `now`.
    ///
    /// Candidates whose cooldown has elapsed are restored before the healthy set is built.
    pub fn select_at(&self, now: Instant) -> Result<String, RouteError> {
        let mut candidates = self.lock();

        for candidate in candidates.iter_mut() {
            if candidate.try_recover(now, self.cooldown) {
                tracing::info!(path = %candidate.path(), "Enabling candidate after cooldown");
                metrics::record_candidate_health(candidate.path(), true);
            }
        }

        let healthy: Vec<&Candidate> = candidates.iter().filter(|c| c.is_healthy()).collect();
        match self.balancer.next_candidate(&healthy) {
            Some(candidate) => Ok(candidate.path().to_string()),
            None => {
                for c in candidates.iter() {
                    tracing::debug!(path = %c.path(), state = ?c.state(), "Candidate status");
                }
                Err(RouteError::NoHealthyCandidate)
            }
        }
    }

    /// Record the outcome of a forwarded request.
    ///
    /// Returns true when a candidate was demoted. Success and unknown paths are no-ops.
    pub fn report_outcome(&self, path: &str, status_code: i64) -> bool {
        self.report_outcome_at(path, status_code, Instant::now())
    }

    pub fn report_outcome_at(&self, path: &str, status_code: i64, now: Instant) -> bool {
        if status_code == SUCCESS_STATUS {
            return false;
        }

        let mut candidates = self.lock();
        let Some(candidate) = candidates.iter_mut().find(|c| c.path() == path) else {
            tracing::debug!(path = %path, status = status_code, "Outcome for unknown candidate ignored");
            return false;
        };

        if candidate.mark_failure(now) {
            metrics::record_candidate_health(path, false);
            metrics::record_candidate_demotion(path);
        }
        tracing::info!(
            path = %path,
            status = status_code,
            cooldown_secs = self.cooldown.as_secs(),
            "Disabling candidate"
        );
        true
    }

    /// Current state of every candidate, in configuration order.
    pub fn snapshot(&self) -> Vec<CandidateStatus> {
        let now = Instant::now();
        self.lock()
            .iter()
            .map(|c| CandidateStatus {
                path: c.path().to_string(),
                healthy: c.is_healthy(),
                secs_since_failure: c
                    .last_failure()
                    .map(|since| now.saturating_duration_since(since).as_secs_f64()),
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Candidate>> {
        // Critical sections never leave the table half-updated.
        self.candidates.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn pool(cooldown: Duration) -> CandidatePool {
        CandidatePool::new(["/a/", "/b/", "/c/"], cooldown)
    }

    #[test]
    fn selects_only_healthy_candidates() {
        let pool = pool(Duration::from_secs(600));
        let now = Instant::now();
        assert!(pool.report_outcome_at("/b/", 500, now));

        for _ in 0..100 {
            let path = pool.select_at(now).unwrap();
            assert!(path == "/a/" || path == "/c/", "got {path}");
        }
    }

    #[test]
    fn success_status_changes_nothing() {
        let pool = pool(Duration::from_secs(600));
        assert!(!pool.report_outcome("/b/", 200));
        assert!(pool.snapshot().iter().all(|c| c.healthy));
    }

    #[test]
    fn unknown_path_is_ignored() {
        let pool = pool(Duration::from_secs(600));
        assert!(!pool.report_outcome("/zzz/", 500));
        assert!(pool.snapshot().iter().all(|c| c.healthy));
    }

    #[test]
    fn exhaustion_when_all_unhealthy() {
        let pool = pool(Duration::from_secs(600));
        let now = Instant::now();
        for path in ["/a/", "/b/", "/c/"] {
            pool.report_outcome_at(path, 503, now);
        }
        assert_eq!(pool.select_at(now), Err(RouteError::NoHealthyCandidate));
        assert_eq!(
            pool.select_at(now + Duration::from_secs(600)),
            Err(RouteError::NoHealthyCandidate)
        );
    }

    #[test]
    fn recovers_after_cooldown_without_reenable_call() {
        let cooldown = Duration::from_secs(60);
        let pool = pool(cooldown);
        let t0 = Instant::now();
        pool.report_outcome_at("/b/", 500, t0);

        // Before the cooldown the candidate never comes back.
        for _ in 0..50 {
            assert_ne!(pool.select_at(t0 + Duration::from_secs(59)).unwrap(), "/b/");
        }

        // The first selection after the cooldown restores it.
        pool.select_at(t0 + cooldown + Duration::from_millis(1)).unwrap();
        assert!(pool.snapshot().iter().all(|c| c.healthy));

        let later = t0 + cooldown + Duration::from_secs(1);
        let mut seen = HashSet::new();
        for _ in 0..300 {
            seen.insert(pool.select_at(later).unwrap());
        }
        assert!(seen.contains("/b/"));
    }

    #[test]
    fn duplicate_paths_are_collapsed() {
        let pool = CandidatePool::new(["/a/", "/a/", "/b/"], Duration::ZERO);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn empty_pool_is_exhausted() {
        let pool = CandidatePool::new(Vec::<String>::new(), Duration::ZERO);
        assert!(pool.is_empty());
        assert_eq!(pool.select(), Err(RouteError::NoHealthyCandidate));
    }

    #[test]
    fn snapshot_reports_failure_age() {
        let pool = pool(Duration::from_secs(600));
        pool.report_outcome("/c/", 429);
        let snapshot = pool.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[2].path, "/c/");
        assert!(!snapshot[2].healthy);
        assert!(snapshot[2].secs_since_failure.is_some());
        assert_eq!(snapshot[0].secs_since_failure, None);
    }

    #[test]
    fn concurrent_select_and_report() {
        let pool = std::sync::Arc::new(pool(Duration::from_secs(600)));
        let mut handles = Vec::new();
        for i in 0..8 {
            let pool = pool.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..500 {
                    if i % 2 == 0 {
                        pool.report_outcome("/b/", 502);
                    } else {
                        let _ = pool.select();
                    }
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert!(!pool.snapshot()[1].healthy);
        for _ in 0..100 {
            assert_ne!(pool.select().unwrap(), "/b/");
        }
    }
}
