//! VarInt framing helpers.
//!
//! Only what the pre-authentication phase needs: reading one length-prefixed
//! frame, decoding primitive fields, and encoding the termination frame.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

/// A VarInt never spans more than five bytes.
const MAX_VARINT_LEN: usize = 5;

/// Errors raised while decoding wire data.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("VarInt longer than 5 bytes")]
    VarIntTooLong,
    #[error("frame length {0} is out of bounds (max {1})")]
    FrameLength(i32, usize),
    #[error("string of {0} bytes exceeds the limit of {1}")]
    StringTooLong(usize, usize),
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
    #[error("unexpected end of packet")]
    Truncated,
    #[error("unexpected packet id {0:#04x}")]
    UnexpectedPacket(i32),
    #[error("unknown handshake intent {0}")]
    UnknownIntent(i32),
    #[error("connection closed")]
    ConnectionClosed,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read a VarInt directly from a stream.
pub async fn read_varint<R: AsyncRead + Unpin>(reader: &mut R) -> Result<i32, CodecError> {
    let mut value: i32 = 0;
    for i in 0..MAX_VARINT_LEN {
        let byte = match reader.read_u8().await {
            Ok(byte) => byte,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(CodecError::ConnectionClosed)
            }
            Err(e) => return Err(e.into()),
        };
        value |= ((byte & 0x7F) as i32) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(CodecError::VarIntTooLong)
}

/// Read one length-prefixed frame.
pub async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
    max_len: usize,
) -> Result<Bytes, CodecError> {
    let len = read_varint(reader).await?;
    if len <= 0 || len as usize > max_len {
        return Err(CodecError::FrameLength(len, max_len));
    }
    let mut frame = vec![0u8; len as usize];
    reader.read_exact(&mut frame).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => CodecError::ConnectionClosed,
        _ => CodecError::Io(e),
    })?;
    Ok(Bytes::from(frame))
}

pub fn get_varint(buf: &mut Bytes) -> Result<i32, CodecError> {
    let mut value: i32 = 0;
    for i in 0..MAX_VARINT_LEN {
        if !buf.has_remaining() {
            return Err(CodecError::Truncated);
        }
        let byte = buf.get_u8();
        value |= ((byte & 0x7F) as i32) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(CodecError::VarIntTooLong)
}

/// Read a string capped at `max_chars` characters.
pub fn get_string(buf: &mut Bytes, max_chars: usize) -> Result<String, CodecError> {
    let len = get_varint(buf)?;
    if len < 0 {
        return Err(CodecError::Truncated);
    }
    let len = len as usize;
    // A character takes at most three bytes on the wire.
    if len > max_chars * 3 {
        return Err(CodecError::StringTooLong(len, max_chars * 3));
    }
    if buf.remaining() < len {
        return Err(CodecError::Truncated);
    }
    let raw = buf.split_to(len);
    let s = std::str::from_utf8(&raw).map_err(|_| CodecError::InvalidUtf8)?;
    let chars = s.chars().count();
    if chars > max_chars {
        return Err(CodecError::StringTooLong(chars, max_chars));
    }
    Ok(s.to_owned())
}

pub fn get_u16(buf: &mut Bytes) -> Result<u16, CodecError> {
    if buf.remaining() < 2 {
        return Err(CodecError::Truncated);
    }
    Ok(buf.get_u16())
}

pub fn put_varint(buf: &mut BytesMut, value: i32) {
    let mut value = value as u32;
    loop {
        if value & !0x7F == 0 {
            buf.put_u8(value as u8);
            return;
        }
        buf.put_u8((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
}

pub fn put_string(buf: &mut BytesMut, value: &str) {
    put_varint(buf, value.len() as i32);
    buf.put_slice(value.as_bytes());
}

pub fn varint_len(value: i32) -> usize {
    let value = value as u32;
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        0x20_0000..=0xFFF_FFFF => 4,
        _ => 5,
    }
}

/// Prefix `body` with its VarInt length.
pub fn frame(body: &[u8]) -> Bytes {
    let mut out = BytesMut::with_capacity(varint_len(body.len() as i32) + body.len());
    put_varint(&mut out, body.len() as i32);
    out.put_slice(body);
    out.freeze()
}
