//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::ProcessorConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Overrides the transport host.
pub const ENV_HOST: &str = "GECHOLOG_HOST";
/// Overrides the transport bearer token.
pub const ENV_TOKEN: &str = "NATS_TOKEN";
/// Read when `NATS_TOKEN` is unset.
pub const ENV_TOKEN_FALLBACK: &str = "GECHOLOG_TOKEN";
/// Overrides the router cooldown, in minutes.
pub const ENV_COOLDOWN_MINUTES: &str = "GECHOLOG_COOLDOWN_MINUTES";
/// Overrides the mock latency rate parameter.
pub const ENV_MOCK_LAMBDA: &str = "LAMBDA";
/// Read when `LAMBDA` is unset.
pub const ENV_MOCK_LAMBDA_FALLBACK: &str = "GECHOLOG_MOCK_LAMBDA";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value '{value}' for {var}")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file, then apply process environment overrides.
pub fn load_config(path: &Path) -> Result<ProcessorConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ProcessorConfig = toml::from_str(&content)?;
    finish(config, |var| std::env::var(var).ok())
}

/// Load from `path` when given, otherwise start from defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<ProcessorConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => finish(ProcessorConfig::default(), |var| std::env::var(var).ok()),
    }
}

/// Apply overrides from `env` and validate.
pub fn finish<F>(mut config: ProcessorConfig, env: F) -> Result<ProcessorConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    apply_env_overrides(&mut config, env)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply the recognized environment overrides. Empty values are ignored.
///
/// `NATS_TOKEN` and `LAMBDA` win over their `GECHOLOG_*` fallbacks.
pub fn apply_env_overrides<F>(config: &mut ProcessorConfig, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |var: &str| env(var).filter(|v| !v.trim().is_empty());
    let first_of = |vars: [&'static str; 2]| {
        vars.into_iter()
            .find_map(|var| lookup(var).map(|value| (var, value)))
    };

    if let Some(host) = lookup(ENV_HOST) {
        config.transport.host = host;
    }
    if let Some((_, token)) = first_of([ENV_TOKEN, ENV_TOKEN_FALLBACK]) {
        config.transport.token = token;
    }
    if let Some(value) = lookup(ENV_COOLDOWN_MINUTES) {
        config.broker.cooldown_minutes = value.trim().parse().map_err(|_| ConfigError::Env {
            var: ENV_COOLDOWN_MINUTES,
            value: value.clone(),
        })?;
    }
    if let Some((var, value)) = first_of([ENV_MOCK_LAMBDA, ENV_MOCK_LAMBDA_FALLBACK]) {
        config.mock.lambda = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Env { var, value: value.clone() })?;
    }
    Ok(())
}
