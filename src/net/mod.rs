//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → tracker.rs (connection id, drain accounting)
//!     → proxy_protocol.rs (optional, trusted load balancer header)
//!     → Hand off to the gate
//! ```
//!
//! # Design Decisions
//! - Bounded accept prevents resource exhaustion
//! - Each connection tracked for graceful shutdown
//! - PROXY headers are only read when the listener is configured to expect them

pub mod listener;
pub mod proxy_protocol;
pub mod tracker;

pub use listener::{ConnectionPermit, Listener, ListenerError};
pub use proxy_protocol::{ProxyHeader, ProxyHeaderError, ProxyVersion};
pub use tracker::{ConnectionGuard, ConnectionId, ConnectionTracker};
