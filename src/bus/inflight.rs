//! In-flight invocation tracking for graceful shutdown.
//!
//! # Responsibilities
//! - Count handler invocations that have started but not replied
//! - Let shutdown wait, bounded by a grace period, for the count to reach zero

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Poll interval while waiting for in-flight work to drain.
const DRAIN_POLL: Duration = Duration::from_millis(10);

/// Shared counter of running invocations.
#[derive(Debug, Clone, Default)]
pub struct InFlightTracker {
    active: Arc<AtomicU64>,
}

impl InFlightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new invocation. The returned guard decrements on drop.
    pub fn track(&self) -> InFlightGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        InFlightGuard {
            active: Arc::clone(&self.active),
        }
    }

    pub fn active(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }

    /// Wait until nothing is in flight. Returns false if `limit` elapsed first.
    pub async fn wait_idle(&self, limit: Duration) -> bool {
        let drained = async {
            while self.active() > 0 {
                tokio::time::sleep(DRAIN_POLL).await;
            }
        };
        tokio::time::timeout(limit, drained).await.is_ok()
    }
}

/// Lifetime of one invocation.
#[derive(Debug)]
pub struct InFlightGuard {
    active: Arc<AtomicU64>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}
