//! Envelope processors for an LLM gateway pipeline.
//!
//! Two processors subscribe to the gateway's message bus and answer each
//! envelope with a patch:
//!
//! - **broker**: redirects requests to a healthy upstream candidate and
//!   demotes candidates that answer with a failure status
//! - **mock**: records upstream responses and replays them for requests on
//!   the mock path, optionally with simulated latency
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────┐
//!   POST          │  ┌────────┐    ┌─────┐    ┌───────────────────┐  │
//!   /subjects/* ──┼─▶│  http  │───▶│ bus │───▶│ processor::broker │  │
//!                 │  │ bridge │◀───│     │◀───│ processor::mock   │  │
//!   reply     ◀───┼──└────────┘    └─────┘    └─────────┬─────────┘  │
//!                 │                                     │            │
//!                 │              ┌──────────────────────┴───┐        │
//!                 │              ▼                          ▼        │
//!                 │   ┌──────────────────┐   ┌────────────────┐      │
//!                 │   │ load_balancer    │   │ mock store +   │      │
//!                 │   │ pool + health    │   │ latency        │      │
//!                 │   └──────────────────┘   └────────────────┘      │
//!                 │                                                  │
//!                 │  config · observability · lifecycle · admin      │
//!                 └──────────────────────────────────────────────────┘
//! ```

pub mod admin;
pub mod bus;
pub mod config;
pub mod envelope;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod mock;
pub mod observability;
pub mod processor;

pub use bus::Bus;
pub use config::schema::ProcessorConfig;
pub use http::HttpServer;
pub use lifecycle::{Processors, Shutdown};
