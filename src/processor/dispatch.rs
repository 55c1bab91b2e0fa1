//! Per-message dispatch and the subscription serve loop.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::Instrument;

use super::{Decision, Outcome, Processor};
use crate::bus::{InFlightTracker, Message, Subscription};
use crate::envelope::Envelope;
use crate::observability::metrics;

/// Parse `data` and hand it to `processor`. Never fails: bad input becomes an empty reply.
pub async fn dispatch<P: Processor>(processor: &P, data: &[u8]) -> Decision {
    match Envelope::parse(data) {
        Ok(envelope) => processor.handle(envelope).await,
        Err(err) => {
            tracing::error!(error = %err, "Malformed envelope");
            Decision::noop(Outcome::Malformed)
        }
    }
}

/// Handle one delivered message and send its reply.
pub async fn handle_message<P: Processor>(processor: Arc<P>, message: Message) {
    let span = tracing::info_span!(
        "message",
        processor = processor.name(),
        subject = %message.subject,
        message_id = %message.id
    );

    async move {
        let start = Instant::now();
        let (data, reply) = message.into_parts();
        tracing::trace!(payload = %String::from_utf8_lossy(&data), "Inbound envelope");

        let decision = dispatch(processor.as_ref(), &data).await;
        metrics::record_message(processor.name(), decision.outcome.as_str());
        metrics::record_dispatch_duration(processor.name(), start);

        let bytes = decision.reply.to_bytes();
        tracing::trace!(
            outcome = %decision.outcome,
            reply = %String::from_utf8_lossy(&bytes),
            "Outbound reply"
        );
        reply.respond(bytes);
    }
    .instrument(span)
    .await
}

/// Receive from `subscription` until shutdown, one task per message.
///
/// Returning drops the subscription. Spawned invocations keep running and
/// are visible through `tracker`.
pub async fn serve<P: Processor>(
    processor: Arc<P>,
    mut subscription: Subscription,
    tracker: InFlightTracker,
    mut shutdown: broadcast::Receiver<()>,
) {
    tracing::info!(
        processor = processor.name(),
        subject = %subscription.subject(),
        queue_group = %subscription.queue_group(),
        "Processor listening"
    );

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!(processor = processor.name(), "Processor stopping");
                break;
            }
            message = subscription.next() => {
                let Some(message) = message else {
                    break;
                };
                let guard = tracker.track();
                let processor = Arc::clone(&processor);
                tokio::spawn(async move {
                    let _guard = guard;
                    handle_message(processor, message).await;
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Bus;
    use crate::envelope::reply::EMPTY_REPLY;
    use crate::envelope::{Context, Reply};
    use std::time::Duration;

    /// Echoes the route path back, panics on request contexts.
    struct Echo;

    impl Processor for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }

        async fn handle(&self, envelope: Envelope) -> Decision {
            if matches!(envelope.context, Context::Request { .. }) {
                panic!("echo does not take requests");
            }
            Decision::new(Reply::route_to(envelope.route_path), Outcome::Routed)
        }
    }

    #[tokio::test]
    async fn malformed_input_is_not_handled() {
        for body in [&b"not json"[..], b"[1,2]", b"{}", b"{\"gl_path\": 5}"] {
            let decision = dispatch(&Echo, body).await;
            assert_eq!(decision, Decision::noop(Outcome::Malformed));
        }
    }

    #[tokio::test]
    async fn handle_message_replies_once() {
        let (message, mut rx) = Message::with_reply("s", br#"{"gl_path":"/a/"}"#.to_vec());
        handle_message(Arc::new(Echo), message).await;

        assert_eq!(rx.recv().await.unwrap(), br#"{"gl_path":"/a/"}"#.to_vec());
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn panicking_handler_still_replies() {
        let bus = Bus::new();
        let shutdown = broadcast::channel(1).0;
        let tracker = InFlightTracker::new();
        tokio::spawn(serve(
            Arc::new(Echo),
            bus.subscribe("echo", "g"),
            tracker.clone(),
            shutdown.subscribe(),
        ));

        let body = br#"{"gl_path":"/a/","ingress_subpath":"x"}"#.to_vec();
        let reply = bus.request("echo", body, Duration::from_secs(2)).await.unwrap();
        assert_eq!(reply, EMPTY_REPLY.to_vec());
        assert!(tracker.wait_idle(Duration::from_secs(2)).await);
    }

    #[tokio::test]
    async fn serve_stops_on_shutdown() {
        let bus = Bus::new();
        let shutdown = broadcast::channel(1).0;
        let handle = tokio::spawn(serve(
            Arc::new(Echo),
            bus.subscribe("echo", "g"),
            InFlightTracker::new(),
            shutdown.subscribe(),
        ));

        let _ = shutdown.send(());
        handle.await.unwrap();
        assert_eq!(bus.subscriber_count("echo"), 0);
    }
}
