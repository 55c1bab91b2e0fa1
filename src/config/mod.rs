//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overrides)
//!     → validation.rs (semantic checks)
//!     → ProcessorConfig (validated, immutable)
//!     → handed to startup, which builds each processor
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the candidate set never changes at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::BrokerConfig;
pub use schema::LifecycleConfig;
pub use schema::MockConfig;
pub use schema::ObservabilityConfig;
pub use schema::ProcessorConfig;
pub use schema::TransportConfig;
