//! Reply (patch) envelopes.

use serde_json::{Map, Value};

use super::{FIELD_CONTROL, FIELD_HEADERS, FIELD_PAYLOAD, FIELD_ROUTE_PATH, FIELD_STATUS_CODE};
use crate::mock::store::RecordedResponse;

/// A patch the pipeline applies to the exchange. Empty means "no opinion".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reply {
    fields: Map<String, Value>,
}

impl Reply {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Redirect the request to `path`.
    pub fn route_to(path: impl Into<String>) -> Self {
        Self::default().with(FIELD_ROUTE_PATH, Value::String(path.into()))
    }

    /// Ask the pipeline to short-circuit with `subpath` as the target.
    /// A leading slash is always added.
    pub fn control(subpath: &str) -> Self {
        Self::default().with(FIELD_CONTROL, Value::String(format!("/{subpath}")))
    }

    /// Substitute a recorded response into the response fields.
    pub fn replay(recorded: &RecordedResponse) -> Self {
        Self::default()
            .with(FIELD_PAYLOAD, recorded.payload.clone())
            .with(FIELD_HEADERS, recorded.headers.clone())
            .with(FIELD_STATUS_CODE, recorded.status_code.clone())
    }

    fn with(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Serialized form sent on the reply channel.
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(&self.fields).unwrap_or_else(|_| EMPTY_REPLY.to_vec())
    }
}

/// Wire form of [`Reply::empty`].
pub const EMPTY_REPLY: &[u8] = b"{}";
