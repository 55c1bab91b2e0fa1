//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the processors.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for a processor host.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Transport binding (listener, credential, reply deadline).
    pub transport: TransportConfig,

    /// Health-aware router settings.
    pub broker: BrokerConfig,

    /// Record/replay mock settings.
    pub mock: MockConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Startup/shutdown settings.
    pub lifecycle: LifecycleConfig,
}

impl ProcessorConfig {
    /// Names of the processors enabled by this configuration.
    pub fn enabled_processors(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.broker.enabled {
            names.push("broker");
        }
        if self.mock.enabled {
            names.push("mock");
        }
        names
    }
}

/// Transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Host the transport listener binds to.
    pub host: String,

    /// Port the transport listener binds to.
    pub port: u16,

    /// Bearer token required on every transport request. Empty disables the check.
    pub token: String,

    /// Maximum time to wait for a processor reply, in seconds.
    pub request_timeout_secs: u64,

    /// Queue group every processor subscription joins.
    pub queue_group: String,
}

impl TransportConfig {
    /// `host:port` string the listener binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The configured token, if any.
    pub fn token(&self) -> Option<&str> {
        if self.token.is_empty() {
            None
        } else {
            Some(&self.token)
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            token: String::new(),
            request_timeout_secs: 30,
            queue_group: "anything".to_string(),
        }
    }
}

/// Health-aware router configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Run the router processor.
    pub enabled: bool,

    /// Subject the router subscribes to.
    pub subject: String,

    /// Route path this router answers for.
    pub ingress_path: String,

    /// Minutes a demoted candidate stays out of rotation.
    pub cooldown_minutes: u64,

    /// Outbound route paths, fixed for the process lifetime.
    pub candidates: Vec<String>,
}

impl BrokerConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_minutes.saturating_mul(60))
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            subject: "coburn.gl.broker".to_string(),
            ingress_path: "/azure/".to_string(),
            cooldown_minutes: 10,
            candidates: vec![
                "/azure/gpt35turbo/".to_string(),
                "/azure/gpt4/".to_string(),
                "/azure/dud/".to_string(),
            ],
        }
    }
}

/// Record/replay mock configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MockConfig {
    /// Run the mock processor.
    pub enabled: bool,

    /// Subject the mock subscribes to.
    pub subject: String,

    /// Route path that triggers replay instead of a real call.
    pub mock_path: String,

    /// Rate parameter of the simulated latency distribution (<= 0 disables).
    pub lambda: f64,

    /// Upper bound on a single simulated delay, in milliseconds.
    pub max_latency_ms: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            subject: "coburn.gl.mock".to_string(),
            mock_path: "/mock/".to_string(),
            lambda: 0.0,
            max_latency_ms: 30_000,
        }
    }
}

impl MockConfig {
    pub fn max_latency(&self) -> Duration {
        Duration::from_millis(self.max_latency_ms)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Time in-flight invocations get to finish after shutdown, in milliseconds.
    pub grace_period_ms: u64,
}

impl LifecycleConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            grace_period_ms: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ProcessorConfig::default();
        assert_eq!(config.broker.cooldown(), Duration::from_secs(600));
        assert_eq!(config.broker.candidates.len(), 3);
        assert_eq!(config.mock.lambda, 0.0);
        assert_eq!(config.transport.bind_address(), "127.0.0.1:8080");
        assert!(config.transport.token().is_none());
        assert_eq!(config.enabled_processors(), vec!["broker", "mock"]);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ProcessorConfig = toml::from_str(
            r#"
            [broker]
            cooldown_minutes = 1
            candidates = ["/a/", "/b/"]

            [mock]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.broker.cooldown(), Duration::from_secs(60));
        assert_eq!(config.broker.ingress_path, "/azure/");
        assert_eq!(config.broker.candidates, vec!["/a/", "/b/"]);
        assert!(!config.mock.enabled);
        assert_eq!(config.mock.mock_path, "/mock/");
        assert_eq!(config.enabled_processors(), vec!["broker"]);
    }
}
