//! Envelope processors.
//!
//! # Data Flow
//! ```text
//! Subscription
//!     → dispatch.rs (one task per message, span, parse, metrics)
//!     → Processor::handle (broker.rs | mock.rs)
//!     → Decision { reply, outcome }
//!     → ReplyHandle::respond
//! ```
//!
//! # Design Decisions
//! - Processors see parsed envelopes only; malformed bytes never reach them
//! - Every branch returns a `Decision`, so every message is answered
//! - The outcome label feeds metrics and logs, never the reply

use std::future::Future;

use crate::envelope::{Envelope, Reply};

pub mod broker;
pub mod dispatch;
pub mod mock;

pub use broker::Broker;
pub use dispatch::{dispatch, handle_message, serve};
pub use mock::Mock;

/// A subscriber that turns one envelope into one reply.
pub trait Processor: Send + Sync + 'static {
    /// Label used in logs and metrics.
    fn name(&self) -> &'static str;

    fn handle(&self, envelope: Envelope) -> impl Future<Output = Decision> + Send;
}

/// What a processor decided for one message.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub reply: Reply,
    pub outcome: Outcome,
}

impl Decision {
    pub fn new(reply: Reply, outcome: Outcome) -> Self {
        Self { reply, outcome }
    }

    /// An empty reply with the given outcome.
    pub fn noop(outcome: Outcome) -> Self {
        Self::new(Reply::empty(), outcome)
    }
}

/// Which branch handled a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Broker picked a candidate.
    Routed,
    /// Broker had no healthy candidate.
    Exhausted,
    /// Addressed to another route.
    Ignored,
    /// Broker recorded an upstream status.
    OutcomeRecorded,
    /// Mock told the pipeline to short-circuit.
    Control,
    /// Mock request without a subpath.
    MissingSubpath,
    /// Mock substituted a recorded response.
    Replayed,
    /// Mock had no recorded response for the key.
    MockMiss,
    /// Mock stored an upstream response.
    Captured,
    /// A required response field was absent.
    Incomplete,
    /// The body was not a usable envelope.
    Malformed,
    /// Neither request nor response markers.
    Unrecognized,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Routed => "routed",
            Outcome::Exhausted => "exhausted",
            Outcome::Ignored => "ignored",
            Outcome::OutcomeRecorded => "outcome_recorded",
            Outcome::Control => "control",
            Outcome::MissingSubpath => "missing_subpath",
            Outcome::Replayed => "replayed",
            Outcome::MockMiss => "mock_miss",
            Outcome::Captured => "captured",
            Outcome::Incomplete => "incomplete",
            Outcome::Malformed => "malformed",
            Outcome::Unrecognized => "unrecognized",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
