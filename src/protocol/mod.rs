//! Protocol subsystem.
//!
//! # Responsibilities
//! - Protocol version numbers and the supported window
//! - Handshake decoding and virtual-host cleanup
//! - Minimal VarInt framing for the pre-authentication phase
//! - Version-correct termination packets

pub mod codec;
pub mod handshake;
pub mod packet;
pub mod version;

pub use codec::CodecError;
pub use handshake::{clean_virtual_host, Handshake, HandshakeIntent};
pub use packet::DisconnectPacket;
pub use version::ProtocolVersion;
