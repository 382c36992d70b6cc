//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Connected hostname (unresolved host, port)
//!     → forced_hosts.rs (forced host lookup, then try list)
//!     → Return: ordered backend names or no route
//! ```
//!
//! # Design Decisions
//! - Routes compiled from config, immutable at runtime
//! - Deterministic: same input always selects the same backends
//! - No DNS: hosts are compared as declared

pub mod forced_hosts;

pub use forced_hosts::ForcedHosts;
