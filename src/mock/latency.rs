//! Simulated upstream latency.

use rand::Rng;
use std::time::Duration;

use crate::observability::metrics;

/// Milliseconds per unit of the exponential draw.
const UNIT_MS: f64 = 100.0;

/// Draws replay delays from an exponential distribution with rate `lambda`.
///
/// The mean delay is `100 / lambda` milliseconds. A non-positive rate disables the delay.
#[derive(Debug, Clone, Copy)]
pub struct LatencySimulator {
    lambda: f64,
    max_delay: Duration,
}

impl LatencySimulator {
    pub fn new(lambda: f64, max_delay: Duration) -> Self {
        Self { lambda, max_delay }
    }

    pub fn disabled() -> Self {
        Self::new(0.0, Duration::ZERO)
    }

    pub fn is_enabled(&self) -> bool {
        self.lambda.is_finite() && self.lambda > 0.0
    }

    /// Draw a delay, or `None` when disabled.
    pub fn sample(&self) -> Option<Duration> {
        if !self.is_enabled() {
            return None;
        }
        let u: f64 = rand::thread_rng().gen();
        Some(self.delay_for(u))
    }

    /// Delay for the uniform draw `u` in `[0, 1)`, by inverse-transform sampling.
    pub fn delay_for(&self, u: f64) -> Duration {
        let exp_sample = -(1.0 - u.clamp(0.0, 1.0 - f64::EPSILON)).ln();
        let millis = (exp_sample / self.lambda * UNIT_MS).min(self.max_delay.as_secs_f64() * 1000.0);
        if millis.is_nan() || millis <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(millis / 1000.0).min(self.max_delay)
    }

    /// Sleep for one sampled delay. Returns the delay applied.
    pub async fn delay(&self) -> Duration {
        let Some(delay) = self.sample() else {
            return Duration::ZERO;
        };
        tracing::debug!(delay_ms = delay.as_millis() as u64, "Simulating latency");
        metrics::record_mock_latency(delay);
        tokio::time::sleep(delay).await;
        delay
    }
}
