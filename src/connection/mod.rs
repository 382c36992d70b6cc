//! Inbound connection identity.
//!
//! # Data Flow
//! ```text
//! Handshake parsed
//!     → transport.rs (socket writer, negotiated version, close-with)
//!     → initial.rs (identity: address, virtual host, version)
//!     → routing / admission query and enrich the identity
//!     → promotion (identity consumed) or disconnect (transport closed)
//! ```
//!
//! # Design Decisions
//! - Two narrow capability traits instead of one wide connection interface
//! - The identity never owns the transport's lifecycle, it only commands a close
//! - Hostnames are never resolved here

pub mod initial;
pub mod transport;

use std::fmt;
use std::net::SocketAddr;

use crate::protocol::ProtocolVersion;

pub use initial::{ConnectionParts, DisconnectHandle, IdentityError, InitialInboundConnection};
pub use transport::{ClientTransport, Transport};

/// Where a connection comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteAddress {
    Inet(SocketAddr),
    /// A trusted upstream reported no address (PROXY `UNKNOWN` / `LOCAL`).
    Unknown,
}

impl RemoteAddress {
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        match self {
            RemoteAddress::Inet(addr) => Some(*addr),
            RemoteAddress::Unknown => None,
        }
    }
}

impl From<SocketAddr> for RemoteAddress {
    fn from(addr: SocketAddr) -> Self {
        RemoteAddress::Inet(addr)
    }
}

impl fmt::Display for RemoteAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteAddress::Inet(addr) => write!(f, "{}", addr),
            RemoteAddress::Unknown => f.write_str("unknown"),
        }
    }
}

/// A host and port that has not been, and will not be, resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnresolvedAddress {
    host: String,
    port: u16,
}

impl UnresolvedAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for UnresolvedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Address and metadata queries on a client connection.
pub trait InboundConnection {
    fn remote_address(&self) -> RemoteAddress;

    /// The virtual host the client asked for, if it declared one.
    fn connected_hostname(&self) -> Option<UnresolvedAddress>;

    fn is_active(&self) -> bool;

    fn protocol_version(&self) -> ProtocolVersion;
}

/// Something that can name the connection it belongs to in log lines.
pub trait ConnectionAssociation {
    fn association_label(&self) -> String;
}
