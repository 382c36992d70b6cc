//! HAProxy PROXY protocol header reader (v1 text, v2 binary).
//!
//! Used only on listeners that sit behind a trusted load balancer: the
//! header's source address replaces the socket peer address. The reader
//! consumes exactly the header, leaving the stream at the first payload byte.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::timeout;

use crate::connection::RemoteAddress;

const V1_PREFIX: &[u8] = b"PROXY ";
const V2_SIGNATURE: &[u8; 12] = b"\r\n\r\n\x00\r\nQUIT\n";

/// Longest legal v1 line, CRLF included.
const V1_MAX_LEN: usize = 107;
/// Address block plus TLVs we are willing to skip.
const V2_MAX_PAYLOAD: usize = 520;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyVersion {
    V1,
    V2,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyHeader {
    pub version: ProxyVersion,
    /// The original client, or `Unknown` for health checks and `LOCAL`.
    pub source: RemoteAddress,
    pub destination: Option<SocketAddr>,
}

#[derive(Debug, Error)]
pub enum ProxyHeaderError {
    #[error("PROXY header timeout")]
    Timeout,
    #[error("no PROXY protocol signature")]
    NotProxyProtocol,
    #[error("invalid PROXY header: {0}")]
    InvalidHeader(String),
    #[error("connection closed before PROXY header completed")]
    ConnectionClosed,
    #[error("IO error: {0}")]
    Io(std::io::Error),
}

impl From<std::io::Error> for ProxyHeaderError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            ProxyHeaderError::ConnectionClosed
        } else {
            ProxyHeaderError::Io(e)
        }
    }
}

/// Read a v1 or v2 header, whichever the first byte announces.
pub async fn read_header<R: AsyncRead + Unpin>(
    reader: &mut R,
    limit: Duration,
) -> Result<ProxyHeader, ProxyHeaderError> {
    match timeout(limit, read_header_inner(reader)).await {
        Ok(result) => result,
        Err(_) => Err(ProxyHeaderError::Timeout),
    }
}

async fn read_header_inner<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<ProxyHeader, ProxyHeaderError> {
    let first = reader.read_u8().await?;
    match first {
        b'P' => read_v1(reader).await,
        b'\r' => read_v2(reader).await,
        _ => Err(ProxyHeaderError::NotProxyProtocol),
    }
}

async fn read_v1<R: AsyncRead + Unpin>(reader: &mut R) -> Result<ProxyHeader, ProxyHeaderError> {
    let mut line = vec![b'P'];
    loop {
        let byte = reader.read_u8().await?;
        line.push(byte);
        if line.len() <= V1_PREFIX.len() && line[line.len() - 1] != V1_PREFIX[line.len() - 1] {
            return Err(ProxyHeaderError::NotProxyProtocol);
        }
        if line.ends_with(b"\r\n") {
            break;
        }
        if line.len() >= V1_MAX_LEN {
            return Err(ProxyHeaderError::InvalidHeader("v1 line too long".into()));
        }
    }
    let text = std::str::from_utf8(&line[V1_PREFIX.len()..line.len() - 2])
        .map_err(|_| ProxyHeaderError::InvalidHeader("v1 line is not ASCII".into()))?;
    parse_v1(text)
}

fn parse_v1(text: &str) -> Result<ProxyHeader, ProxyHeaderError> {
    let invalid = |msg: &str| ProxyHeaderError::InvalidHeader(msg.to_string());
    let parts: Vec<&str> = text.split(' ').collect();
    match parts.first().copied() {
        Some("UNKNOWN") => Ok(ProxyHeader {
            version: ProxyVersion::V1,
            source: RemoteAddress::Unknown,
            destination: None,
        }),
        Some(family @ ("TCP4" | "TCP6")) => {
            if parts.len() != 5 {
                return Err(invalid("v1 expects four address fields"));
            }
            let src_ip: IpAddr = parts[1].parse().map_err(|_| invalid("bad source address"))?;
            let dst_ip: IpAddr = parts[2].parse().map_err(|_| invalid("bad destination address"))?;
            let src_port: u16 = parts[3].parse().map_err(|_| invalid("bad source port"))?;
            let dst_port: u16 = parts[4].parse().map_err(|_| invalid("bad destination port"))?;
            let v4 = family == "TCP4";
            if src_ip.is_ipv4() != v4 || dst_ip.is_ipv4() != v4 {
                return Err(invalid("address family mismatch"));
            }
            Ok(ProxyHeader {
                version: ProxyVersion::V1,
                source: RemoteAddress::Inet(SocketAddr::new(src_ip, src_port)),
                destination: Some(SocketAddr::new(dst_ip, dst_port)),
            })
        }
        _ => Err(invalid("unknown v1 protocol family")),
    }
}

async fn read_v2<R: AsyncRead + Unpin>(reader: &mut R) -> Result<ProxyHeader, ProxyHeaderError> {
    let mut fixed = [0u8; 15];
    reader.read_exact(&mut fixed).await?;
    if fixed[..11] != V2_SIGNATURE[1..] {
        return Err(ProxyHeaderError::NotProxyProtocol);
    }
    let version_command = fixed[11];
    let family = fixed[12];
    let len = u16::from_be_bytes([fixed[13], fixed[14]]) as usize;

    if version_command >> 4 != 2 {
        return Err(ProxyHeaderError::InvalidHeader(format!(
            "unsupported v2 version {}",
            version_command >> 4
        )));
    }
    if len > V2_MAX_PAYLOAD {
        return Err(ProxyHeaderError::InvalidHeader(format!("v2 payload of {} bytes", len)));
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;

    let local = match version_command & 0x0F {
        0x0 => true,
        0x1 => false,
        other => {
            return Err(ProxyHeaderError::InvalidHeader(format!("unknown v2 command {}", other)))
        }
    };
    if local {
        return Ok(ProxyHeader {
            version: ProxyVersion::V2,
            source: RemoteAddress::Unknown,
            destination: None,
        });
    }

    let short = || ProxyHeaderError::InvalidHeader("v2 address block too short".into());
    let (source, destination) = match family >> 4 {
        0x1 => {
            if payload.len() < 12 {
                return Err(short());
            }
            let src = Ipv4Addr::new(payload[0], payload[1], payload[2], payload[3]);
            let dst = Ipv4Addr::new(payload[4], payload[5], payload[6], payload[7]);
            let src_port = u16::from_be_bytes([payload[8], payload[9]]);
            let dst_port = u16::from_be_bytes([payload[10], payload[11]]);
            (
                SocketAddr::new(IpAddr::V4(src), src_port),
                SocketAddr::new(IpAddr::V4(dst), dst_port),
            )
        }
        0x2 => {
            if payload.len() < 36 {
                return Err(short());
            }
            let mut src = [0u8; 16];
            let mut dst = [0u8; 16];
            src.copy_from_slice(&payload[0..16]);
            dst.copy_from_slice(&payload[16..32]);
            let src_port = u16::from_be_bytes([payload[32], payload[33]]);
            let dst_port = u16::from_be_bytes([payload[34], payload[35]]);
            (
                SocketAddr::new(IpAddr::V6(Ipv6Addr::from(src)), src_port),
                SocketAddr::new(IpAddr::V6(Ipv6Addr::from(dst)), dst_port),
            )
        }
        _ => {
            // AF_UNSPEC or AF_UNIX: nothing usable as a client address.
            return Ok(ProxyHeader {
                version: ProxyVersion::V2,
                source: RemoteAddress::Unknown,
                destination: None,
            });
        }
    };

    Ok(ProxyHeader {
        version: ProxyVersion::V2,
        source: RemoteAddress::Inet(source),
        destination: Some(destination),
    })
}
