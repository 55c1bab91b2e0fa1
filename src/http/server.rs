//! HTTP server setup.
//!
//! # Responsibilities
//! - Create Axum Router with the publish and admin handlers
//! - Wire up middleware (request ID, tracing, timeout, token)
//! - Translate bus errors into HTTP status codes
//! - Serve until the shutdown future resolves

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderName, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::{self, auth::token_auth_middleware};
use crate::bus::{Bus, BusError};
use crate::load_balancer::CandidatePool;
use crate::mock::MockStore;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Slack between the bus reply timeout and the outer HTTP timeout.
const TIMEOUT_MARGIN: Duration = Duration::from_secs(1);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub bus: Bus,
    /// Present when the broker runs.
    pub candidates: Option<Arc<CandidatePool>>,
    /// Present when the mock runs.
    pub mocks: Option<MockStore>,
    pub processors: Vec<&'static str>,
    pub token: Option<Arc<str>>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(bus: Bus, request_timeout: Duration) -> Self {
        Self {
            bus,
            candidates: None,
            mocks: None,
            processors: Vec::new(),
            token: None,
            request_timeout,
        }
    }
}

/// HTTP bridge for the processor bus.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        Self {
            router: Self::build_router(state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState) -> Router {
        let request_id = HeaderName::from_static(X_REQUEST_ID);
        let timeout = state.request_timeout + TIMEOUT_MARGIN;

        Router::new()
            .route("/subjects/{subject}", post(publish_handler))
            .merge(admin::admin_routes())
            .layer(middleware::from_fn_with_state(
                state.clone(),
                token_auth_middleware,
            ))
            .with_state(state)
            .layer(TimeoutLayer::new(timeout))
            .layer(PropagateRequestIdLayer::new(request_id.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
    }

    /// The router, for driving the bridge without a listener.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve on `listener` until `shutdown` resolves.
    ///
    /// Open requests then get `grace` to finish. Whatever is still running
    /// after that is abandoned and this returns `Ok`.
    pub async fn run<F>(
        self,
        listener: TcpListener,
        shutdown: F,
        grace: Duration,
    ) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP bridge starting");

        let (stopping_tx, stopping_rx) = oneshot::channel();
        let signal = async move {
            shutdown.await;
            let _ = stopping_tx.send(());
        };

        let serve = axum::serve(listener, self.router)
            .with_graceful_shutdown(signal)
            .into_future();
        tokio::pin!(serve);

        tokio::select! {
            biased;
            served = &mut serve => {
                served?;
                tracing::info!("HTTP bridge stopped");
                return Ok(());
            }
            _ = stopping_rx => {}
        }

        match tokio::time::timeout(grace, serve).await {
            Ok(served) => {
                served?;
                tracing::info!("HTTP bridge stopped");
            }
            Err(_) => {
                tracing::warn!(
                    grace_ms = grace.as_millis() as u64,
                    "Abandoning open HTTP requests after grace period"
                );
            }
        }
        Ok(())
    }
}

/// Publish the body on `subject` and return the first reply.
async fn publish_handler(
    State(state): State<AppState>,
    Path(subject): Path<String>,
    body: Bytes,
) -> Response {
    match state
        .bus
        .request(&subject, body.to_vec(), state.request_timeout)
        .await
    {
        Ok(reply) => ([(header::CONTENT_TYPE, "application/json")], reply).into_response(),
        Err(err) => {
            tracing::warn!(subject = %subject, error = %err, "Publish failed");
            (status_for(&err), err.to_string()).into_response()
        }
    }
}

fn status_for(err: &BusError) -> StatusCode {
    match err {
        BusError::NoResponders(_) => StatusCode::NOT_FOUND,
        BusError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        BusError::Closed => StatusCode::BAD_GATEWAY,
    }
}
