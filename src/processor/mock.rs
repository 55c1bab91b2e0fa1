//! Record-and-replay processor.
//!
//! Genuine upstream responses are captured by route path. Requests on the
//! mock path are short-circuited with a control directive, and the resulting
//! response is answered from the store, optionally after a simulated delay.

use super::{Decision, Outcome, Processor};
use crate::config::MockConfig;
use crate::envelope::context::text_of;
use crate::envelope::{
    Context, Envelope, Reply, ResponseFields, FIELD_HEADERS, FIELD_PAYLOAD, FIELD_STATUS_CODE,
};
use crate::mock::{LatencySimulator, MockStore, RecordedResponse};

#[derive(Debug)]
pub struct Mock {
    mock_path: String,
    store: MockStore,
    latency: LatencySimulator,
}

impl Mock {
    pub fn new(mock_path: impl Into<String>, store: MockStore, latency: LatencySimulator) -> Self {
        Self {
            mock_path: mock_path.into(),
            store,
            latency,
        }
    }

    pub fn from_config(config: &MockConfig) -> Self {
        Self::new(
            config.mock_path.clone(),
            MockStore::new(),
            LatencySimulator::new(config.lambda, config.max_latency()),
        )
    }

    pub fn store(&self) -> &MockStore {
        &self.store
    }

    fn short_circuit(&self, route_path: &str, subpath: &str) -> Decision {
        if route_path != self.mock_path {
            tracing::debug!(path = %route_path, "Not addressed to the mock");
            return Decision::noop(Outcome::Ignored);
        }
        if subpath.is_empty() {
            tracing::warn!(path = %route_path, "Mock request without ingress_subpath");
            return Decision::noop(Outcome::MissingSubpath);
        }
        Decision::new(Reply::control(subpath), Outcome::Control)
    }

    async fn replay(&self, response: &ResponseFields) -> Decision {
        let key = response.payload.as_ref().map(text_of).unwrap_or_default();
        if key.is_empty() {
            tracing::error!(field = FIELD_PAYLOAD, "Mock response carries no lookup key");
            return Decision::noop(Outcome::Incomplete);
        }

        let Some((matched, recorded)) = self.store.lookup(&key) else {
            tracing::warn!(key = %key, "No recorded response");
            return Decision::noop(Outcome::MockMiss);
        };

        let delay = self.latency.delay().await;
        tracing::debug!(
            key = %key,
            matched = %matched,
            delay_ms = delay.as_millis() as u64,
            "Replaying recorded response"
        );
        Decision::new(Reply::replay(&recorded), Outcome::Replayed)
    }

    fn capture(&self, route_path: &str, response: ResponseFields) -> Decision {
        let ResponseFields {
            raw_status_code,
            payload,
            headers,
            ..
        } = response;

        let recorded = match (payload, headers, raw_status_code) {
            (Some(payload), Some(headers), Some(status_code)) => RecordedResponse {
                payload,
                headers,
                status_code,
            },
            (payload, headers, _) => {
                let missing = if payload.is_none() {
                    FIELD_PAYLOAD
                } else if headers.is_none() {
                    FIELD_HEADERS
                } else {
                    FIELD_STATUS_CODE
                };
                tracing::warn!(path = %route_path, field = missing, "Response not captured, field missing");
                return Decision::noop(Outcome::Incomplete);
            }
        };

        self.store.capture(route_path, recorded);
        tracing::debug!(path = %route_path, entries = self.store.len(), "Captured response");
        Decision::noop(Outcome::Captured)
    }
}

impl Processor for Mock {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn handle(&self, envelope: Envelope) -> Decision {
        let Envelope {
            route_path,
            context,
        } = envelope;

        match context {
            Context::Request { subpath }
            | Context::Response(ResponseFields {
                subpath: Some(subpath),
                ..
            }) => self.short_circuit(&route_path, &subpath),
            Context::Response(response) if route_path == self.mock_path => {
                self.replay(&response).await
            }
            Context::Response(response) => self.capture(&route_path, response),
            Context::Unrecognized => {
                tracing::debug!(path = %route_path, "Envelope is neither request nor response");
                Decision::noop(Outcome::Unrecognized)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn mock() -> Mock {
        Mock::new("/mock/", MockStore::new(), LatencySimulator::disabled())
    }

    async fn handle(mock: &Mock, value: Value) -> Decision {
        let envelope = Envelope::parse(value.to_string().as_bytes()).unwrap();
        mock.handle(envelope).await
    }

    fn reply_json(decision: &Decision) -> Value {
        serde_json::from_slice(&decision.reply.to_bytes()).unwrap()
    }

    #[tokio::test]
    async fn request_on_mock_path_short_circuits() {
        let decision = handle(&mock(), json!({"gl_path": "/mock/", "ingress_subpath": "azure/gpt4/chat"})).await;
        assert_eq!(decision.outcome, Outcome::Control);
        assert_eq!(reply_json(&decision), json!({"control": "/azure/gpt4/chat"}));
    }

    #[tokio::test]
    async fn subpath_takes_precedence_over_status() {
        let decision = handle(
            &mock(),
            json!({"gl_path": "/mock/", "ingress_subpath": "azure/x", "egress_status_code": 200}),
        )
        .await;
        assert_eq!(decision.outcome, Outcome::Control);
        assert_eq!(reply_json(&decision), json!({"control": "/azure/x"}));
    }

    #[tokio::test]
    async fn request_with_response_fields_is_not_captured() {
        let mock = mock();
        let decision = handle(
            &mock,
            json!({
                "gl_path": "/azure/",
                "ingress_subpath": "chat",
                "egress_status_code": 200,
                "egress_payload": {},
                "egress_headers": {}
            }),
        )
        .await;
        assert_eq!(decision, Decision::noop(Outcome::Ignored));
        assert!(mock.store().is_empty());
    }

    #[tokio::test]
    async fn request_elsewhere_is_ignored() {
        let decision = handle(&mock(), json!({"gl_path": "/azure/", "ingress_subpath": "chat"})).await;
        assert_eq!(decision, Decision::noop(Outcome::Ignored));
    }

    #[tokio::test]
    async fn empty_subpath_is_rejected() {
        let decision = handle(&mock(), json!({"gl_path": "/mock/", "ingress_subpath": ""})).await;
        assert_eq!(decision, Decision::noop(Outcome::MissingSubpath));
    }

    #[tokio::test]
    async fn captures_then_replays_by_prefix() {
        let mock = mock();
        let captured = handle(
            &mock,
            json!({
                "gl_path": "/azure/gpt4/",
                "egress_status_code": 200,
                "egress_payload": {"a": 1},
                "egress_headers": {"Content-Type": ["application/json"]}
            }),
        )
        .await;
        assert_eq!(captured, Decision::noop(Outcome::Captured));
        assert_eq!(mock.store().len(), 1);

        let replayed = handle(
            &mock,
            json!({
                "gl_path": "/mock/",
                "egress_status_code": 200,
                "egress_payload": "/azure/gpt4/chat/completions"
            }),
        )
        .await;
        assert_eq!(replayed.outcome, Outcome::Replayed);
        assert_eq!(
            reply_json(&replayed),
            json!({
                "egress_payload": {"a": 1},
                "egress_headers": {"Content-Type": ["application/json"]},
                "egress_status_code": 200
            })
        );
    }

    #[tokio::test]
    async fn recapture_overwrites() {
        let mock = mock();
        for body in [json!({"a": 1}), json!({"b": 2})] {
            handle(
                &mock,
                json!({"gl_path": "/x/", "egress_status_code": 201, "egress_payload": body, "egress_headers": {}}),
            )
            .await;
        }
        assert_eq!(mock.store().get("/x/").unwrap().payload, json!({"b": 2}));
    }

    #[tokio::test]
    async fn replay_miss_replies_empty() {
        let decision = handle(
            &mock(),
            json!({"gl_path": "/mock/", "egress_status_code": 200, "egress_payload": "/nothing/here"}),
        )
        .await;
        assert_eq!(decision, Decision::noop(Outcome::MockMiss));
    }

    #[tokio::test]
    async fn replay_without_key_replies_empty() {
        let decision = handle(
            &mock(),
            json!({"gl_path": "/mock/", "egress_status_code": 200, "egress_headers": {}}),
        )
        .await;
        assert_eq!(decision, Decision::noop(Outcome::Incomplete));
    }

    #[tokio::test]
    async fn partial_response_is_not_captured() {
        let mock = mock();
        let missing_headers = json!({"gl_path": "/x/", "egress_status_code": 200, "egress_payload": {}});
        let missing_status = json!({"gl_path": "/x/", "egress_payload": {}, "egress_headers": {}});

        for body in [missing_headers, missing_status] {
            let decision = handle(&mock, body).await;
            assert_eq!(decision, Decision::noop(Outcome::Incomplete));
        }
        assert!(mock.store().is_empty());
    }

    #[tokio::test]
    async fn unrecognized_is_a_noop() {
        let decision = handle(&mock(), json!({"gl_path": "/mock/"})).await;
        assert_eq!(decision, Decision::noop(Outcome::Unrecognized));
    }
}
