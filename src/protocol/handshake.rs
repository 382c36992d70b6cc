//! The handshake packet and virtual-host cleanup.

use bytes::{Buf, Bytes, BytesMut};

use super::codec::{self, CodecError};
use super::version::ProtocolVersion;

/// Packet id of the handshake in the handshake state.
pub const HANDSHAKE_PACKET_ID: i32 = 0x00;

/// Hostnames may carry forwarding data after a NUL byte, so the cap is
/// a full DNS name plus room for those markers.
pub const MAX_HOSTNAME_LENGTH: usize = 255 + 32;

/// What the client wants to do after the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeIntent {
    Status,
    Login,
    Transfer,
}

impl HandshakeIntent {
    pub fn from_id(id: i32) -> Result<Self, CodecError> {
        match id {
            1 => Ok(Self::Status),
            2 => Ok(Self::Login),
            3 => Ok(Self::Transfer),
            other => Err(CodecError::UnknownIntent(other)),
        }
    }

    pub fn id(&self) -> i32 {
        match self {
            Self::Status => 1,
            Self::Login => 2,
            Self::Transfer => 3,
        }
    }

    /// Login and transfer both lead to a player session.
    pub fn is_login(&self) -> bool {
        matches!(self, Self::Login | Self::Transfer)
    }
}

/// The first packet of every modern connection. Read-only once decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    protocol_version: ProtocolVersion,
    server_address: String,
    port: u16,
    intent: HandshakeIntent,
}

impl Handshake {
    pub fn new(
        protocol_version: ProtocolVersion,
        server_address: impl Into<String>,
        port: u16,
        intent: HandshakeIntent,
    ) -> Self {
        Self {
            protocol_version,
            server_address: server_address.into(),
            port,
            intent,
        }
    }

    /// Decode a handshake frame body, packet id included.
    pub fn decode(frame: &mut Bytes) -> Result<Self, CodecError> {
        let packet_id = codec::get_varint(frame)?;
        if packet_id != HANDSHAKE_PACKET_ID {
            return Err(CodecError::UnexpectedPacket(packet_id));
        }
        let protocol_version = ProtocolVersion::new(codec::get_varint(frame)?);
        let server_address = codec::get_string(frame, MAX_HOSTNAME_LENGTH)?;
        let port = codec::get_u16(frame)?;
        let intent = HandshakeIntent::from_id(codec::get_varint(frame)?)?;
        if frame.has_remaining() {
            tracing::debug!(trailing = frame.remaining(), "Handshake carries trailing bytes");
        }
        Ok(Self {
            protocol_version,
            server_address,
            port,
            intent,
        })
    }

    /// Encode as a frame body, packet id included.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        codec::put_varint(&mut buf, HANDSHAKE_PACKET_ID);
        codec::put_varint(&mut buf, self.protocol_version.protocol());
        codec::put_string(&mut buf, &self.server_address);
        bytes::BufMut::put_u16(&mut buf, self.port);
        codec::put_varint(&mut buf, self.intent.id());
        buf.freeze()
    }

    pub fn protocol_version(&self) -> ProtocolVersion {
        self.protocol_version
    }

    /// The raw address string as sent, before cleanup.
    pub fn server_address(&self) -> &str {
        &self.server_address
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn intent(&self) -> HandshakeIntent {
        self.intent
    }
}

/// Normalise a declared virtual host.
///
/// Everything from the first NUL byte is forwarding or mod-loader data. A
/// single trailing dot is left behind by clients that followed an SRV record.
pub fn clean_virtual_host(raw: &str) -> String {
    let cleaned = match raw.find('\0') {
        Some(idx) => &raw[..idx],
        None => raw,
    };
    let cleaned = cleaned.strip_suffix('.').unwrap_or(cleaned);
    cleaned.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_strips_srv_dot_and_case() {
        assert_eq!(clean_virtual_host("MyServer.Example.COM."), "myserver.example.com");
    }

    #[test]
    fn clean_strips_forwarding_markers() {
        assert_eq!(clean_virtual_host("play.example.com\0FML2\0"), "play.example.com");
        assert_eq!(
            clean_virtual_host("lobby.example.com.\0203.0.113.7\0uuid"),
            "lobby.example.com"
        );
    }

    #[test]
    fn clean_keeps_plain_hosts() {
        assert_eq!(clean_virtual_host("localhost"), "localhost");
        assert_eq!(clean_virtual_host(""), "");
    }

    #[test]
    fn decode_login_handshake() {
        let original = Handshake::new(
            ProtocolVersion::new(765),
            "Play.Example.com",
            25565,
            HandshakeIntent::Login,
        );
        let mut body = original.encode();
        let decoded = Handshake::decode(&mut body).unwrap();
        assert_eq!(decoded, original);
        assert!(decoded.intent().is_login());
    }

    #[test]
    fn decode_rejects_unknown_intent() {
        let mut buf = BytesMut::new();
        codec::put_varint(&mut buf, HANDSHAKE_PACKET_ID);
        codec::put_varint(&mut buf, 765);
        codec::put_string(&mut buf, "example.com");
        bytes::BufMut::put_u16(&mut buf, 25565);
        codec::put_varint(&mut buf, 7);
        let err = Handshake::decode(&mut buf.freeze()).unwrap_err();
        assert!(matches!(err, CodecError::UnknownIntent(7)));
    }

    #[test]
    fn decode_rejects_other_packets() {
        let mut body = Bytes::from_static(&[0x01, 0x00]);
        assert!(matches!(
            Handshake::decode(&mut body),
            Err(CodecError::UnexpectedPacket(1))
        ));
    }
}
