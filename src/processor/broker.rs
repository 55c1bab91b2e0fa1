//! Health-aware routing processor.
//!
//! Requests arriving on the ingress path are redirected to a healthy
//! candidate. Responses carrying an upstream status feed candidate health.

use std::sync::Arc;

use super::{Decision, Outcome, Processor};
use crate::config::BrokerConfig;
use crate::envelope::{Context, Envelope, Reply};
use crate::load_balancer::CandidatePool;

#[derive(Debug)]
pub struct Broker {
    ingress_path: String,
    pool: Arc<CandidatePool>,
}

impl Broker {
    pub fn new(ingress_path: impl Into<String>, pool: Arc<CandidatePool>) -> Self {
        Self {
            ingress_path: ingress_path.into(),
            pool,
        }
    }

    pub fn from_config(config: &BrokerConfig) -> Self {
        Self::new(
            config.ingress_path.clone(),
            Arc::new(CandidatePool::from_config(config)),
        )
    }

    pub fn pool(&self) -> &Arc<CandidatePool> {
        &self.pool
    }

    fn route(&self, envelope: &Envelope) -> Decision {
        if envelope.route_path != self.ingress_path {
            tracing::debug!(path = %envelope.route_path, "Not addressed to this broker");
            return Decision::noop(Outcome::Ignored);
        }

        match self.pool.select() {
            Ok(candidate) => {
                tracing::debug!(candidate = %candidate, "Routing request");
                Decision::new(Reply::route_to(candidate), Outcome::Routed)
            }
            Err(err) => {
                tracing::warn!(error = %err, path = %envelope.route_path, "Request left unrouted");
                Decision::noop(Outcome::Exhausted)
            }
        }
    }
}

impl Processor for Broker {
    fn name(&self) -> &'static str {
        "broker"
    }

    async fn handle(&self, envelope: Envelope) -> Decision {
        if let Context::Response(response) = &envelope.context {
            if let Some(status) = response.status_code.filter(|code| *code > 0) {
                self.pool.report_outcome(&envelope.route_path, status);
                return Decision::noop(Outcome::OutcomeRecorded);
            }
        }
        self.route(&envelope)
    }
}
