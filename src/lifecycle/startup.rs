//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the enabled processors from configuration
//! - Subscribe them to their subjects before any traffic arrives
//! - Bind the HTTP bridge and serve until shutdown
//! - Drain in-flight invocations within the grace period
//!
//! # Design Decisions
//! - Fail fast: metrics and bind errors are fatal
//! - Processors subscribe before the listener binds

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use super::{signals, Shutdown};
use crate::bus::{Bus, InFlightTracker};
use crate::config::loader::ConfigError;
use crate::config::ProcessorConfig;
use crate::http::{AppState, HttpServer};
use crate::observability::metrics;
use crate::processor::{serve, Broker, Mock};

/// Fatal errors before or while serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to initialize logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("failed to install metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP bridge failed: {0}")]
    Serve(#[source] std::io::Error),
}

/// The running processors of one host.
pub struct Processors {
    pub broker: Option<Arc<Broker>>,
    pub mock: Option<Arc<Mock>>,
    pub tracker: InFlightTracker,
    names: Vec<&'static str>,
    tasks: Vec<JoinHandle<()>>,
}

impl Processors {
    /// Subscribe every enabled processor to `bus`.
    pub fn start(config: &ProcessorConfig, bus: &Bus, shutdown: &Shutdown) -> Self {
        let tracker = InFlightTracker::new();
        let queue_group = &config.transport.queue_group;
        let mut tasks = Vec::new();

        let broker = config.broker.enabled.then(|| {
            let broker = Arc::new(Broker::from_config(&config.broker));
            let subscription = bus.subscribe(&config.broker.subject, queue_group);
            tasks.push(tokio::spawn(serve(
                Arc::clone(&broker),
                subscription,
                tracker.clone(),
                shutdown.subscribe(),
            )));
            broker
        });

        let mock = config.mock.enabled.then(|| {
            let mock = Arc::new(Mock::from_config(&config.mock));
            let subscription = bus.subscribe(&config.mock.subject, queue_group);
            tasks.push(tokio::spawn(serve(
                Arc::clone(&mock),
                subscription,
                tracker.clone(),
                shutdown.subscribe(),
            )));
            mock
        });

        Self {
            broker,
            mock,
            tracker,
            names: config.enabled_processors(),
            tasks,
        }
    }

    /// HTTP state exposing these processors on `bus`.
    pub fn app_state(&self, config: &ProcessorConfig, bus: Bus) -> AppState {
        AppState {
            candidates: self.broker.as_ref().map(|b| Arc::clone(b.pool())),
            mocks: self.mock.as_ref().map(|m| m.store().clone()),
            processors: self.names.clone(),
            token: config.transport.token().map(Arc::from),
            ..AppState::new(bus, config.transport.request_timeout())
        }
    }

    /// Wait for the serve loops to exit, then for in-flight work up to `grace`.
    ///
    /// Returns false if invocations were still running when the grace period ended.
    pub async fn stop(self, grace: Duration) -> bool {
        for task in self.tasks {
            if let Err(err) = task.await {
                tracing::error!(error = %err, "Processor task failed");
            }
        }

        let drained = self.tracker.wait_idle(grace).await;
        if drained {
            tracing::info!("All in-flight messages answered");
        } else {
            tracing::warn!(
                remaining = self.tracker.active(),
                grace_ms = grace.as_millis() as u64,
                "Abandoning in-flight messages after grace period"
            );
        }
        drained
    }
}

/// Run the host until a termination signal, then shut down in order.
pub async fn run(config: ProcessorConfig) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let bus = Bus::new();
    let shutdown = Shutdown::new();
    let processors = Processors::start(&config, &bus, &shutdown);

    let address = config.transport.bind_address();
    let listener = match TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(source) => {
            shutdown.trigger();
            return Err(StartupError::Bind { address, source });
        }
    };

    signals::spawn_signal_handler(shutdown.clone());

    let grace = config.lifecycle.grace_period();
    let server = HttpServer::new(processors.app_state(&config, bus));
    let served = server.run(listener, shutdown.signalled(), grace).await;
    shutdown.trigger();

    processors.stop(grace).await;
    tracing::info!("Shutdown complete");
    served.map_err(StartupError::Serve)
}
