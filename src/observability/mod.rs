//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems emit tracing events
//!     → logging.rs (filter, then text or JSON to stdout)
//! ```
//!
//! # Design Decisions
//! - Structured fields (peer_addr, connection_id, reason) instead of
//!   interpolated strings where a machine may read them
//! - RUST_LOG overrides the configured level

pub mod logging;

pub use logging::init;
