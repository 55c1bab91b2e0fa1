//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, lambda >= 0, ports valid)
//! - Check the router candidate set is usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProcessorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ProcessorConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("no processor is enabled")]
    NoProcessorEnabled,

    #[error("{0}: subject must not be empty")]
    EmptySubject(&'static str),

    #[error("{0} must not be empty")]
    EmptyPath(&'static str),

    #[error("broker.candidates must not be empty")]
    NoCandidates,

    #[error("broker.candidates[{0}] must not be empty")]
    EmptyCandidate(usize),

    #[error("broker.candidates contains duplicate path '{0}'")]
    DuplicateCandidate(String),

    #[error("mock.lambda must be a finite number >= 0, got {0}")]
    InvalidLambda(f64),

    #[error("transport.port must not be 0")]
    InvalidPort,

    #[error("transport.request_timeout_secs must be greater than 0")]
    InvalidTimeout,

    #[error("observability.log_format must be 'pretty' or 'json', got '{0}'")]
    UnknownLogFormat(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Validate a loaded configuration, collecting every problem found.
pub fn validate_config(config: &ProcessorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !config.broker.enabled && !config.mock.enabled {
        errors.push(ValidationError::NoProcessorEnabled);
    }

    if config.broker.enabled {
        if config.broker.subject.is_empty() {
            errors.push(ValidationError::EmptySubject("broker"));
        }
        if config.broker.ingress_path.is_empty() {
            errors.push(ValidationError::EmptyPath("broker.ingress_path"));
        }
        if config.broker.candidates.is_empty() {
            errors.push(ValidationError::NoCandidates);
        }

        let mut seen = HashSet::new();
        for (i, path) in config.broker.candidates.iter().enumerate() {
            if path.is_empty() {
                errors.push(ValidationError::EmptyCandidate(i));
            } else if !seen.insert(path.as_str()) {
                errors.push(ValidationError::DuplicateCandidate(path.clone()));
            }
        }
    }

    if config.mock.enabled {
        if config.mock.subject.is_empty() {
            errors.push(ValidationError::EmptySubject("mock"));
        }
        if config.mock.mock_path.is_empty() {
            errors.push(ValidationError::EmptyPath("mock.mock_path"));
        }
        if !config.mock.lambda.is_finite() || config.mock.lambda < 0.0 {
            errors.push(ValidationError::InvalidLambda(config.mock.lambda));
        }
    }

    if config.transport.port == 0 {
        errors.push(ValidationError::InvalidPort);
    }
    if config.transport.request_timeout_secs == 0 {
        errors.push(ValidationError::InvalidTimeout);
    }

    match config.observability.log_format.as_str() {
        "pretty" | "json" => {}
        other => errors.push(ValidationError::UnknownLogFormat(other.to_string())),
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
