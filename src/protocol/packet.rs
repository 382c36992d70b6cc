//! The termination (disconnect) packet.

use bytes::{BufMut, Bytes, BytesMut};

use super::codec;
use super::version::ProtocolVersion;
use crate::text::{serializer, Component};

/// Login-state disconnect packet id.
pub const LOGIN_DISCONNECT_PACKET_ID: i32 = 0x00;

/// Pre-netty kick packet id.
pub const LEGACY_KICK_PACKET_ID: u8 = 0xFF;

/// The kick length prefix is a u16 count of UTF-16 units.
const MAX_LEGACY_KICK_UNITS: usize = u16::MAX as usize;

/// A termination message already rendered for one protocol version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectPacket {
    /// JSON chat, sent as a framed login disconnect.
    Json(String),
    /// Section-formatted text for pre-netty clients.
    Legacy(String),
}

impl DisconnectPacket {
    /// Build the packet appropriate for `version` from an already translated reason.
    pub fn create(reason: &Component, version: ProtocolVersion) -> Self {
        if version.is_legacy() {
            return Self::Legacy(serializer::legacy_section(reason));
        }
        let downsample = !version.supports_hex_colors();
        Self::Json(serializer::json(reason, downsample).to_string())
    }

    /// Wire bytes, framing included.
    pub fn encode(&self) -> Bytes {
        match self {
            Self::Json(json) => {
                let mut body = BytesMut::with_capacity(json.len() + 6);
                codec::put_varint(&mut body, LOGIN_DISCONNECT_PACKET_ID);
                codec::put_string(&mut body, json);
                codec::frame(&body)
            }
            Self::Legacy(text) => {
                let units: Vec<u16> = text
                    .encode_utf16()
                    .take(MAX_LEGACY_KICK_UNITS)
                    .collect();
                let mut out = BytesMut::with_capacity(3 + units.len() * 2);
                out.put_u8(LEGACY_KICK_PACKET_ID);
                out.put_u16(units.len() as u16);
                for unit in units {
                    out.put_u16(unit);
                }
                out.freeze()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::{NamedColor, TextColor};

    #[test]
    fn legacy_clients_get_kick_packet() {
        let packet = DisconnectPacket::create(
            &Component::text("old").color(NamedColor::Red),
            ProtocolVersion::LEGACY,
        );
        assert_eq!(packet, DisconnectPacket::Legacy("§cold".into()));
        let bytes = packet.encode();
        assert_eq!(bytes[0], 0xFF);
        assert_eq!(&bytes[1..3], &[0x00, 0x05]);
        assert_eq!(&bytes[3..5], &[0x00, 0xA7]);
        assert_eq!(bytes.len(), 3 + 5 * 2);
    }

    #[test]
    fn oversized_legacy_kick_is_clamped() {
        let bytes = DisconnectPacket::Legacy("x".repeat(70_000)).encode();
        assert_eq!(&bytes[1..3], &[0xFF, 0xFF]);
        assert_eq!(bytes.len(), 3 + 65_535 * 2);
    }

    #[test]
    fn json_downsampled_before_1_16() {
        let reason = Component::text("x").color(TextColor::Rgb(255, 0, 0));
        let old = DisconnectPacket::create(&reason, ProtocolVersion::MINECRAFT_1_8);
        let new = DisconnectPacket::create(&reason, ProtocolVersion::MINECRAFT_1_16);
        assert_eq!(old, DisconnectPacket::Json(r#"{"color":"dark_red","text":"x"}"#.into()));
        assert_eq!(new, DisconnectPacket::Json(r##"{"color":"#ff0000","text":"x"}"##.into()));
    }

    #[test]
    fn json_frame_layout() {
        let packet = DisconnectPacket::Json(r#"{"text":"bye"}"#.into());
        let bytes = packet.encode();
        let json_len = r#"{"text":"bye"}"#.len();
        assert_eq!(bytes[0] as usize, 1 + 1 + json_len);
        assert_eq!(bytes[1], 0x00);
        assert_eq!(bytes[2] as usize, json_len);
        assert_eq!(&bytes[3..], br#"{"text":"bye"}"#);
    }
}
