//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define processor metrics (messages, latency, candidate health, mock store)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `gl_messages_total` (counter): handled messages by processor, outcome
//! - `gl_dispatch_duration_seconds` (histogram): handler latency by processor
//! - `gl_candidate_healthy` (gauge): 1=healthy, 0=unhealthy, by path
//! - `gl_candidate_demotions_total` (counter): healthy → unhealthy transitions, by path
//! - `gl_mock_entries` (gauge): recorded responses held
//! - `gl_mock_latency_seconds` (histogram): simulated replay delays
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels for processor, outcome and candidate path

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Install the Prometheus exporter listening on `addr`. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_message(processor: &'static str, outcome: &'static str) {
    counter!("gl_messages_total", "processor" => processor, "outcome" => outcome).increment(1);
}

pub fn record_dispatch_duration(processor: &'static str, start: Instant) {
    histogram!("gl_dispatch_duration_seconds", "processor" => processor)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_candidate_health(path: &str, healthy: bool) {
    gauge!("gl_candidate_healthy", "path" => path.to_string()).set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_candidate_demotion(path: &str) {
    counter!("gl_candidate_demotions_total", "path" => path.to_string()).increment(1);
}

pub fn record_mock_entries(count: usize) {
    gauge!("gl_mock_entries").set(count as f64);
}

pub fn record_mock_latency(delay: Duration) {
    histogram!("gl_mock_latency_seconds").record(delay.as_secs_f64());
}
