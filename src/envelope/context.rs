//! Envelope parsing and request/response classification.

use serde_json::{Map, Value};
use thiserror::Error;

use super::{FIELD_HEADERS, FIELD_PAYLOAD, FIELD_ROUTE_PATH, FIELD_STATUS_CODE, FIELD_SUBPATH};

/// Why an inbound message could not be read as an envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("envelope is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("envelope is not a JSON object")]
    NotAnObject,

    #[error("gl_path not found")]
    MissingRoutePath,
}

/// Fields of a response-context envelope. Absent or null fields are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseFields {
    /// Status as an integer, when it is a number or a numeric string.
    pub status_code: Option<i64>,
    /// The status fragment exactly as received.
    pub raw_status_code: Option<Value>,
    pub payload: Option<Value>,
    pub headers: Option<Value>,
    /// Subpath carried next to an outcome. Only the mock acts on it.
    pub subpath: Option<String>,
}

impl ResponseFields {
    /// True when this response reports an upstream outcome.
    pub fn has_outcome(&self) -> bool {
        self.status_code.is_some_and(|code| code > 0)
    }
}

/// Which phase of the exchange an envelope belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum Context {
    /// Outbound request, not yet forwarded.
    Request { subpath: String },
    /// Response to a forwarded (or short-circuited) request.
    Response(ResponseFields),
    /// Carries neither request nor response markers.
    Unrecognized,
}

/// A parsed inbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub route_path: String,
    pub context: Context,
}

impl Envelope {
    /// The subpath, whether the envelope is a request or carries one next to an outcome.
    pub fn subpath(&self) -> Option<&str> {
        match &self.context {
            Context::Request { subpath } => Some(subpath),
            Context::Response(response) => response.subpath.as_deref(),
            Context::Unrecognized => None,
        }
    }

    /// Parse raw message bytes.
    ///
    /// Classification order: a status code above zero makes a response; otherwise a
    /// subpath field makes a request; otherwise a payload or headers field makes a
    /// response without an outcome; anything else is unrecognized. A subpath seen
    /// alongside an outcome is kept in [`ResponseFields::subpath`].
    pub fn parse(data: &[u8]) -> Result<Self, EnvelopeError> {
        let value: Value = serde_json::from_slice(data)?;
        let Value::Object(mut fields) = value else {
            return Err(EnvelopeError::NotAnObject);
        };

        let route_path = match fields.remove(FIELD_ROUTE_PATH) {
            Some(Value::String(path)) if !path.is_empty() => path,
            _ => return Err(EnvelopeError::MissingRoutePath),
        };

        let raw_status_code = take(&mut fields, FIELD_STATUS_CODE);
        let status_code = raw_status_code.as_ref().and_then(status_from);
        let subpath = take(&mut fields, FIELD_SUBPATH).map(|v| text_of(&v));
        let payload = take(&mut fields, FIELD_PAYLOAD);
        let headers = take(&mut fields, FIELD_HEADERS);

        let mut response = ResponseFields {
            status_code,
            raw_status_code,
            payload,
            headers,
            subpath: None,
        };

        let context = if response.has_outcome() {
            response.subpath = subpath;
            Context::Response(response)
        } else if let Some(subpath) = subpath {
            Context::Request { subpath }
        } else if response.payload.is_some() || response.headers.is_some() {
            Context::Response(response)
        } else {
            Context::Unrecognized
        };

        Ok(Self {
            route_path,
            context,
        })
    }
}

/// Textual form of a fragment: string contents for strings, compact JSON otherwise.
pub fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn take(fields: &mut Map<String, Value>, key: &str) -> Option<Value> {
    fields.remove(key).filter(|v| !v.is_null())
}

fn status_from(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
