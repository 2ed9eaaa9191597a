//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overrides for secrets and identifiers)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → injected into the pipeline at construction
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - Operational fields have defaults; secrets and identifiers never do
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod secret;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    DownstreamConfig, HeaderConfig, ListenerConfig, LogFormat, ObservabilityConfig, RelayConfig,
    TimeoutConfig,
};
pub use secret::SecretString;
pub use validation::{validate_config, ValidationError};
