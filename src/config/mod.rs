//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GateConfig (validated, immutable)
//!     → shared via Arc with the gate
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads and validates
//!     → gate swaps its live settings atomically
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Bind address and connection limit only take effect on restart

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AdmissionConfig, GateConfig, ListenerConfig, MessagesConfig, ObservabilityConfig,
    ProxyProtocolConfig, RoutingConfig, TimeoutConfig,
};
pub use validation::ValidationError;
pub use watcher::ConfigWatcher;
