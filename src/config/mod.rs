//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML), optional
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → SimConfig (validated, immutable)
//!     → consumed once at startup by each subsystem
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ClusterEventsConfig, ErrorLabelMode, FaultConfig, ListenerConfig, LogFormat,
    ObservabilityConfig, ProcessingConfig, SimConfig, TimeoutConfig,
};
