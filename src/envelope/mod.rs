//! Envelope codec.
//!
//! # Data Flow
//! ```text
//! Inbound bytes
//!     → context.rs (parse JSON, read route path, classify once)
//!     → Envelope { route_path, context: Request | Response | Unrecognized }
//!     → processor decides
//!     → reply.rs (build the patch object)
//!     → Outbound bytes ("{}" when there is nothing to change)
//! ```
//!
//! # Design Decisions
//! - Classification happens once at parse time, processors match on the variant
//! - Payload, headers and status fragments stay opaque `serde_json::Value`s
//! - Only top-level fields are read or written

pub mod context;
pub mod reply;

pub use context::{Context, Envelope, EnvelopeError, ResponseFields};
pub use reply::Reply;

/// Route path of the message, present in both contexts.
pub const FIELD_ROUTE_PATH: &str = "gl_path";
/// Subpath of the inbound request; marks a request context.
pub const FIELD_SUBPATH: &str = "ingress_subpath";
/// Upstream status code; marks a response context when greater than zero.
pub const FIELD_STATUS_CODE: &str = "egress_status_code";
/// Upstream response body.
pub const FIELD_PAYLOAD: &str = "egress_payload";
/// Upstream response headers.
pub const FIELD_HEADERS: &str = "egress_headers";
/// Directive telling the pipeline to short-circuit instead of forwarding.
pub const FIELD_CONTROL: &str = "control";

/// The status code that counts as a successful upstream call.
pub const SUCCESS_STATUS: i64 = 200;
