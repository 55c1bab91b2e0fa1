//! Shared utilities for integration testing.

#![allow(dead_code)]

use serde_json::Value;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use gl_processors::config::ProcessorConfig;
use gl_processors::{Bus, HttpServer, Processors, Shutdown};

pub const BROKER_SUBJECT: &str = "coburn.gl.broker";
pub const MOCK_SUBJECT: &str = "coburn.gl.mock";
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(2);

/// A processor host with its bus and, optionally, a live HTTP bridge.
pub struct TestHost {
    pub config: ProcessorConfig,
    pub bus: Bus,
    pub shutdown: Shutdown,
    pub processors: Processors,
    pub addr: Option<SocketAddr>,
    server: Option<JoinHandle<Result<(), std::io::Error>>>,
}

impl TestHost {
    /// Start processors on an in-process bus, without HTTP.
    pub fn start(config: ProcessorConfig) -> Self {
        let bus = Bus::new();
        let shutdown = Shutdown::new();
        let processors = Processors::start(&config, &bus, &shutdown);
        Self {
            config,
            bus,
            shutdown,
            processors,
            addr: None,
            server: None,
        }
    }

    /// Start processors and an HTTP bridge on an ephemeral port.
    pub async fn start_http(config: ProcessorConfig) -> Self {
        let mut host = Self::start(config);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        host.addr = Some(listener.local_addr().unwrap());

        let server = HttpServer::new(host.processors.app_state(&host.config, host.bus.clone()));
        let grace = host.config.lifecycle.grace_period();
        host.server = Some(tokio::spawn(server.run(
            listener,
            host.shutdown.signalled(),
            grace,
        )));
        host
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr.expect("host started without HTTP"), path)
    }

    /// Request/reply over the bus, decoded as JSON.
    pub async fn request(&self, subject: &str, envelope: Value) -> Value {
        let reply = self
            .bus
            .request(subject, envelope.to_string().into_bytes(), REPLY_TIMEOUT)
            .await
            .unwrap();
        serde_json::from_slice(&reply).unwrap()
    }

    /// Trigger shutdown and wait for everything to stop.
    pub async fn stop(self) -> bool {
        self.shutdown.trigger();
        if let Some(server) = self.server {
            server.await.unwrap().unwrap();
        }
        self.processors
            .stop(self.config.lifecycle.grace_period())
            .await
    }
}

/// Default configuration with a short reply timeout.
pub fn test_config() -> ProcessorConfig {
    let mut config = ProcessorConfig::default();
    config.transport.request_timeout_secs = 2;
    config
}

/// A client that bypasses system proxies and does not pool connections.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
