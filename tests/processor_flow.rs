//! End-to-end processor scenarios over the in-process bus.

use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

mod common;

use common::{test_config, TestHost, BROKER_SUBJECT, MOCK_SUBJECT};

#[tokio::test]
async fn broker_routes_and_demotes() {
    let host = TestHost::start(test_config());

    let failure = host
        .request(BROKER_SUBJECT, json!({"gl_path": "/azure/gpt4/", "egress_status_code": 500}))
        .await;
    assert_eq!(failure, json!({}));

    let mut seen = HashSet::new();
    for _ in 0..100 {
        let reply = host
            .request(BROKER_SUBJECT, json!({"gl_path": "/azure/", "ingress_subpath": "chat"}))
            .await;
        seen.insert(reply["gl_path"].as_str().unwrap().to_string());
    }
    assert!(!seen.contains("/azure/gpt4/"));
    assert!(seen.iter().all(|p| p == "/azure/gpt35turbo/" || p == "/azure/dud/"));

    assert!(host.stop().await);
}

#[tokio::test]
async fn broker_ignores_other_routes() {
    let host = TestHost::start(test_config());
    let reply = host
        .request(BROKER_SUBJECT, json!({"gl_path": "/openai/", "ingress_subpath": "chat"}))
        .await;
    assert_eq!(reply, json!({}));
    host.stop().await;
}

#[tokio::test]
async fn broker_exhaustion_replies_empty() {
    let host = TestHost::start(test_config());
    for path in ["/azure/gpt35turbo/", "/azure/gpt4/", "/azure/dud/"] {
        host.request(BROKER_SUBJECT, json!({"gl_path": path, "egress_status_code": 503}))
            .await;
    }

    let reply = host
        .request(BROKER_SUBJECT, json!({"gl_path": "/azure/", "ingress_subpath": "chat"}))
        .await;
    assert_eq!(reply, json!({}));
    host.stop().await;
}

#[tokio::test]
async fn mock_records_then_replays() {
    let host = TestHost::start(test_config());

    let upstream = json!({
        "gl_path": "/azure/gpt4/",
        "egress_status_code": 200,
        "egress_payload": {"choices": [{"text": "hi"}]},
        "egress_headers": {"Content-Type": ["application/json"]}
    });
    assert_eq!(host.request(MOCK_SUBJECT, upstream).await, json!({}));

    let control = host
        .request(MOCK_SUBJECT, json!({"gl_path": "/mock/", "ingress_subpath": "azure/gpt4/chat"}))
        .await;
    assert_eq!(control, json!({"control": "/azure/gpt4/chat"}));

    let replay = host
        .request(
            MOCK_SUBJECT,
            json!({"gl_path": "/mock/", "egress_status_code": 200, "egress_payload": "/azure/gpt4/chat"}),
        )
        .await;
    assert_eq!(
        replay,
        json!({
            "egress_payload": {"choices": [{"text": "hi"}]},
            "egress_headers": {"Content-Type": ["application/json"]},
            "egress_status_code": 200
        })
    );
    host.stop().await;
}

#[tokio::test]
async fn mock_miss_replies_empty() {
    let host = TestHost::start(test_config());
    let reply = host
        .request(
            MOCK_SUBJECT,
            json!({"gl_path": "/mock/", "egress_status_code": 200, "egress_payload": "/x/y/z"}),
        )
        .await;
    assert_eq!(reply, json!({}));
    host.stop().await;
}

#[tokio::test]
async fn longest_prefix_wins() {
    let host = TestHost::start(test_config());
    for (path, marker) in [("/x/", 1), ("/x/y/", 2)] {
        host.request(
            MOCK_SUBJECT,
            json!({"gl_path": path, "egress_status_code": 200, "egress_payload": {"m": marker}, "egress_headers": {}}),
        )
        .await;
    }

    let reply = host
        .request(
            MOCK_SUBJECT,
            json!({"gl_path": "/mock/", "egress_status_code": 200, "egress_payload": "/x/y/z"}),
        )
        .await;
    assert_eq!(reply["egress_payload"], json!({"m": 2}));
    host.stop().await;
}

#[tokio::test]
async fn malformed_envelopes_get_one_empty_reply() {
    let host = TestHost::start(test_config());
    for body in [&b"not json"[..], b"[]", b"{\"ingress_subpath\":\"x\"}"] {
        for subject in [BROKER_SUBJECT, MOCK_SUBJECT] {
            let reply = host
                .bus
                .request(subject, body.to_vec(), common::REPLY_TIMEOUT)
                .await
                .unwrap();
            assert_eq!(reply, b"{}".to_vec());
        }
    }
    host.stop().await;
}

#[tokio::test]
async fn replay_latency_delays_only_its_own_reply() {
    let mut config = test_config();
    // A tiny rate makes every draw exceed the cap, so the delay is the cap.
    config.mock.lambda = 1e-6;
    config.mock.max_latency_ms = 400;
    let host = Arc::new(TestHost::start(config));

    host.request(
        MOCK_SUBJECT,
        json!({"gl_path": "/r/", "egress_status_code": 200, "egress_payload": "ok", "egress_headers": {}}),
    )
    .await;

    let started = Instant::now();
    let slow = {
        let host = Arc::clone(&host);
        tokio::spawn(async move {
            host.request(
                MOCK_SUBJECT,
                json!({"gl_path": "/mock/", "egress_status_code": 200, "egress_payload": "/r/"}),
            )
            .await
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    let control = host
        .request(MOCK_SUBJECT, json!({"gl_path": "/mock/", "ingress_subpath": "r/x"}))
        .await;
    assert_eq!(control, json!({"control": "/r/x"}));
    assert!(started.elapsed() < Duration::from_millis(350));
    assert!(!slow.is_finished());

    let reply: Value = slow.await.unwrap();
    assert_eq!(reply["egress_payload"], json!("ok"));
    assert!(started.elapsed() >= Duration::from_millis(390));

    let host = Arc::into_inner(host).unwrap();
    assert!(host.stop().await);
}

#[tokio::test]
async fn shutdown_stops_subscriptions() {
    let mut config = test_config();
    config.lifecycle.grace_period_ms = 100;
    let host = TestHost::start(config);
    let bus = host.bus.clone();
    assert_eq!(bus.subscriber_count(BROKER_SUBJECT), 1);

    assert!(host.stop().await);
    assert_eq!(bus.subscriber_count(BROKER_SUBJECT), 0);

    let err = bus
        .request(BROKER_SUBJECT, b"{}".to_vec(), Duration::from_millis(100))
        .await
        .unwrap_err();
    assert!(matches!(err, gl_processors::bus::BusError::NoResponders(_)));
}
