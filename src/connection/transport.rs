//! Transport abstraction and the tokio-backed client transport.
//!
//! # Responsibilities
//! - Own the socket write half through a dedicated writer task
//! - Hold the negotiated protocol version
//! - Send-then-close, exactly once, from any task
//! - Notice a peer hangup seen on the read side
//!
//! # Design Decisions
//! - Every write goes through one queue, so a termination packet always
//!   lands after frames queued before it and nothing is written after it
//! - Write failures end the writer quietly; there is no retry

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Weak};

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream};
use tokio::sync::{mpsc, watch};

use super::RemoteAddress;
use crate::protocol::{DisconnectPacket, ProtocolVersion};

/// The lower-level connection an identity observes and commands.
pub trait Transport: Send + Sync + fmt::Debug {
    fn remote_address(&self) -> RemoteAddress;

    fn is_active(&self) -> bool;

    fn protocol_version(&self) -> ProtocolVersion;

    /// Write `packet` and close. Calls after the first are no-ops and
    /// return false.
    fn close_with(&self, packet: DisconnectPacket) -> bool;
}

enum Outbound {
    Frame(Bytes),
    Close(Bytes),
    PeerClosed,
}

/// Buffer between the socket read half and the session layer's reader.
const HANGUP_PIPE_CAPACITY: usize = 16 * 1024;

/// A client socket whose write half is driven by a background task.
pub struct ClientTransport {
    remote: RemoteAddress,
    protocol_version: AtomicI32,
    closing: AtomicBool,
    outbound: mpsc::UnboundedSender<Outbound>,
    active: watch::Receiver<bool>,
}

impl ClientTransport {
    /// Spawn the writer task for `writer` and return the transport.
    pub fn spawn<W>(writer: W, remote: RemoteAddress) -> Arc<Self>
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (outbound, queue) = mpsc::unbounded_channel();
        let (active_tx, active) = watch::channel(true);
        tokio::spawn(write_loop(writer, queue, active_tx, remote));

        Arc::new(Self {
            remote,
            protocol_version: AtomicI32::new(ProtocolVersion::UNKNOWN.protocol()),
            closing: AtomicBool::new(false),
            outbound,
            active,
        })
    }

    /// Record the version declared in the handshake.
    pub fn set_protocol_version(&self, version: ProtocolVersion) {
        self.protocol_version.store(version.protocol(), Ordering::Release);
    }

    /// Queue a pre-framed packet. Returns false once the transport is closing.
    pub fn send(&self, frame: Bytes) -> bool {
        if self.closing.load(Ordering::Acquire) {
            return false;
        }
        self.outbound.send(Outbound::Frame(frame)).is_ok()
    }

    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::Acquire)
    }

    /// The peer went away: stop writing and report the transport inactive.
    /// A later `close_with` is a no-op.
    pub fn mark_peer_closed(&self) {
        if self.closing.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::debug!(remote = %self.remote, "Peer closed the connection");
        let _ = self.outbound.send(Outbound::PeerClosed);
    }

    /// Relay `reader` through a pipe, marking the transport closed when the
    /// peer's side reaches EOF or fails. The relay notices a hangup even while
    /// nobody reads the returned stream, up to the pipe's capacity.
    pub fn watch_hangup<R>(self: &Arc<Self>, reader: R) -> DuplexStream
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let (relay, session) = tokio::io::duplex(HANGUP_PIPE_CAPACITY);
        tokio::spawn(relay_reads(reader, relay, Arc::downgrade(self)));
        session
    }

    /// Resolves once the socket has been shut down.
    pub async fn closed(&self) {
        let mut active = self.active.clone();
        // An Err means the writer task is gone, which also means closed.
        let _ = active.wait_for(|active| !*active).await;
    }
}

impl Transport for ClientTransport {
    fn remote_address(&self) -> RemoteAddress {
        self.remote
    }

    fn is_active(&self) -> bool {
        *self.active.borrow()
    }

    fn protocol_version(&self) -> ProtocolVersion {
        ProtocolVersion::new(self.protocol_version.load(Ordering::Acquire))
    }

    fn close_with(&self, packet: DisconnectPacket) -> bool {
        if self.closing.swap(true, Ordering::AcqRel) {
            tracing::trace!(remote = %self.remote, "Close requested on a closing transport");
            return false;
        }
        if self.outbound.send(Outbound::Close(packet.encode())).is_err() {
            tracing::debug!(remote = %self.remote, "Writer already gone, nothing to close");
        }
        true
    }
}

impl fmt::Debug for ClientTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientTransport")
            .field("remote", &self.remote)
            .field("protocol_version", &self.protocol_version())
            .field("closing", &self.is_closing())
            .field("active", &self.is_active())
            .finish()
    }
}

async fn write_loop<W>(
    mut writer: W,
    mut queue: mpsc::UnboundedReceiver<Outbound>,
    active: watch::Sender<bool>,
    remote: RemoteAddress,
) where
    W: AsyncWrite + Send + Unpin,
{
    while let Some(message) = queue.recv().await {
        match message {
            Outbound::Frame(frame) => {
                if let Err(e) = writer.write_all(&frame).await {
                    tracing::debug!(remote = %remote, error = %e, "Write failed");
                    break;
                }
            }
            Outbound::Close(frame) => {
                if let Err(e) = writer.write_all(&frame).await {
                    tracing::debug!(remote = %remote, error = %e, "Termination packet not delivered");
                } else if let Err(e) = writer.flush().await {
                    tracing::debug!(remote = %remote, error = %e, "Flush failed during close");
                }
                break;
            }
            Outbound::PeerClosed => break,
        }
    }

    queue.close();
    let _ = writer.shutdown().await;
    active.send_replace(false);
    tracing::trace!(remote = %remote, "Transport closed");
}

async fn relay_reads<R>(mut reader: R, mut relay: DuplexStream, transport: Weak<ClientTransport>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; 4096];
    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                tracing::debug!(error = %e, "Client read failed");
                break;
            }
        };
        // The session layer dropped its reader; the peer may still be there.
        if relay.write_all(&buf[..n]).await.is_err() {
            return;
        }
    }
    if let Some(transport) = transport.upgrade() {
        transport.mark_peer_closed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    fn remote() -> RemoteAddress {
        RemoteAddress::Inet("127.0.0.1:40000".parse().unwrap())
    }

    #[tokio::test]
    async fn close_with_writes_then_closes() {
        let (client, server) = tokio::io::duplex(1024);
        let transport = ClientTransport::spawn(server, remote());
        assert!(transport.is_active());

        let packet = DisconnectPacket::Json(r#"{"text":"bye"}"#.into());
        transport.close_with(packet.clone());
        transport.closed().await;
        assert!(!transport.is_active());

        let mut received = Vec::new();
        let mut client = client;
        client.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, packet.encode().to_vec());
    }

    #[tokio::test]
    async fn second_close_is_noop() {
        let (mut client, server) = tokio::io::duplex(1024);
        let transport = ClientTransport::spawn(server, remote());

        assert!(transport.close_with(DisconnectPacket::Json("\"a\"".into())));
        assert!(!transport.close_with(DisconnectPacket::Json("\"b\"".into())));
        transport.closed().await;

        let mut received = Vec::new();
        client.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, DisconnectPacket::Json("\"a\"".into()).encode().to_vec());
    }

    #[tokio::test]
    async fn frames_before_close_keep_order_and_send_fails_after() {
        let (mut client, server) = tokio::io::duplex(1024);
        let transport = ClientTransport::spawn(server, remote());

        assert!(transport.send(Bytes::from_static(b"\x01\x07")));
        transport.close_with(DisconnectPacket::Legacy("x".into()));
        assert!(!transport.send(Bytes::from_static(b"\x01\x08")));
        transport.closed().await;

        let mut received = Vec::new();
        client.read_to_end(&mut received).await.unwrap();
        let mut expected = b"\x01\x07".to_vec();
        expected.extend_from_slice(&DisconnectPacket::Legacy("x".into()).encode());
        assert_eq!(received, expected);
    }

    #[tokio::test]
    async fn peer_hangup_clears_liveness() {
        let (mut client, server) = tokio::io::duplex(1024);
        let (read_half, write_half) = tokio::io::split(server);
        let transport = ClientTransport::spawn(write_half, remote());
        let mut session = transport.watch_hangup(read_half);

        client.write_all(b"hello").await.unwrap();
        drop(client);

        tokio::time::timeout(std::time::Duration::from_secs(5), transport.closed())
            .await
            .unwrap();
        assert!(!transport.is_active());
        assert!(!transport.close_with(DisconnectPacket::Json("\"late\"".into())));

        let mut received = Vec::new();
        session.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"hello");
    }

    #[tokio::test]
    async fn negotiated_version() {
        let (_client, server) = tokio::io::duplex(64);
        let transport = ClientTransport::spawn(server, remote());
        assert!(transport.protocol_version().is_unknown());
        transport.set_protocol_version(ProtocolVersion::new(765));
        assert_eq!(transport.protocol_version(), ProtocolVersion::new(765));
    }
}
