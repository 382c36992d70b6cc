//! Inbound connection gate for a Minecraft-compatible proxy.
//!
//! Accepts client sockets, reads the optional PROXY header and the
//! handshake, exposes the connection's identity, and either hands it to
//! the session layer or disconnects it with a message the client's
//! protocol version can display.

pub mod config;
pub mod connection;
pub mod gate;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod protocol;
pub mod routing;
pub mod text;

pub use config::GateConfig;
pub use connection::{ConnectionAssociation, InboundConnection, InitialInboundConnection};
pub use gate::{Gate, SessionHandoff};
pub use lifecycle::Shutdown;
