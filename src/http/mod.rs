//! HTTP bridge onto the bus.
//!
//! # Data Flow
//! ```text
//! POST /subjects/{subject}
//!     → request ID, trace, timeout layers
//!     → admin::auth (transport token)
//!     → server.rs (publish body, await first reply)
//!     → 200 reply body | 404 no responders | 504 timeout
//! ```

pub mod server;

pub use server::{AppState, HttpServer, X_REQUEST_ID};
