//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! topology file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → BrokerConfig (validated, immutable)
//!     → broker::topology applies it to a Broker
//!
//! On file change (serve --watch):
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → broker::topology applies the difference
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Header argument types come straight from TOML types (string vs integer)

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    BindingConfig, BrokerConfig, BrokerSettings, ExchangeConfig, ObservabilityConfig, QueueConfig,
};
pub use validation::ValidationError;
