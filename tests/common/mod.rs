//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tracing_subscriber::fmt::MakeWriter;

use inbound_gate::connection::{RemoteAddress, Transport};
use inbound_gate::gate::{PendingSession, SessionHandoff};
use inbound_gate::protocol::codec;
use inbound_gate::protocol::{DisconnectPacket, Handshake, HandshakeIntent, ProtocolVersion};

pub fn peer() -> SocketAddr {
    "203.0.113.7:40000".parse().unwrap()
}

/// Transport that records the termination packet instead of writing it.
#[derive(Debug)]
pub struct RecordingTransport {
    remote: RemoteAddress,
    version: ProtocolVersion,
    active: AtomicBool,
    closes: Mutex<Vec<DisconnectPacket>>,
}

impl RecordingTransport {
    pub fn new(version: i32) -> Arc<Self> {
        Arc::new(Self {
            remote: RemoteAddress::Inet(peer()),
            version: ProtocolVersion::new(version),
            active: AtomicBool::new(true),
            closes: Mutex::new(Vec::new()),
        })
    }

    pub fn closes(&self) -> Vec<DisconnectPacket> {
        self.closes.lock().unwrap().clone()
    }
}

impl Transport for RecordingTransport {
    fn remote_address(&self) -> RemoteAddress {
        self.remote
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn protocol_version(&self) -> ProtocolVersion {
        self.version
    }

    fn close_with(&self, packet: DisconnectPacket) -> bool {
        if !self.active.swap(false, Ordering::SeqCst) {
            return false;
        }
        self.closes.lock().unwrap().push(packet);
        true
    }
}

/// In-memory log sink for `tracing_subscriber::fmt`.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Install an INFO-level subscriber writing into the returned buffer, for
/// as long as the guard lives on this thread.
pub fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buffer, guard)
}

/// Session layer stand-in that forwards promoted sessions to a channel.
pub struct ChannelHandoff {
    pub online: AtomicUsize,
    sessions: mpsc::UnboundedSender<PendingSession>,
}

impl ChannelHandoff {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<PendingSession>) {
        let (sessions, rx) = mpsc::unbounded_channel();
        let handoff = Arc::new(Self {
            online: AtomicUsize::new(0),
            sessions,
        });
        (handoff, rx)
    }
}

impl SessionHandoff for ChannelHandoff {
    fn online_players(&self) -> usize {
        self.online.load(Ordering::SeqCst)
    }

    fn promote(&self, session: PendingSession) {
        let _ = self.sessions.send(session);
    }
}

/// A framed handshake as a client would send it.
pub fn handshake_frame(version: i32, host: &str, port: u16, intent: HandshakeIntent) -> Bytes {
    let handshake = Handshake::new(ProtocolVersion::new(version), host, port, intent);
    codec::frame(&handshake.encode())
}

/// Read one login disconnect frame and return its JSON payload.
pub async fn read_disconnect<R: AsyncRead + Unpin>(reader: &mut R) -> String {
    let mut frame = codec::read_frame(reader, 1 << 16).await.unwrap();
    assert_eq!(codec::get_varint(&mut frame).unwrap(), 0x00);
    codec::get_string(&mut frame, 262_144).unwrap()
}
