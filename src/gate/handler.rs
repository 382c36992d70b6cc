//! Per-connection pre-authentication handler.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};

use super::admission::{AdmissionPolicy, Rejection};
use super::Gate;
use crate::connection::{
    ClientTransport, InboundConnection, InitialInboundConnection, RemoteAddress, Transport,
};
use crate::net::proxy_protocol::{self, ProxyHeaderError};
use crate::protocol::codec::{self, CodecError};
use crate::protocol::{clean_virtual_host, Handshake, HandshakeIntent, ProtocolVersion};
use crate::text::{Component, Locale, NamedColor};

/// Handshakes are tiny; anything bigger is not a game client.
pub const MAX_HANDSHAKE_FRAME: usize = 1024;

/// First byte of a pre-netty server list ping.
const LEGACY_PING: u8 = 0xFE;
/// First byte of a pre-1.7 login handshake.
const LEGACY_LOGIN: u8 = 0x02;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("PROXY header: {0}")]
    ProxyHeader(#[from] ProxyHeaderError),
    #[error("handshake: {0}")]
    Codec(#[from] CodecError),
    #[error("handshake not received in time")]
    ReadTimeout,
}

/// How the pre-authentication phase ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Promoted,
    Rejected(Rejection),
}

/// An admitted connection on its way to the session layer.
pub struct PendingSession {
    pub connection: InitialInboundConnection,
    /// The rest of the client stream, positioned after the handshake.
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
    /// Ordered backend candidates selected for the virtual host.
    pub backends: Vec<String>,
    /// Locale the gate renders messages in.
    pub locale: Locale,
}

impl fmt::Debug for PendingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingSession")
            .field("connection", &self.connection)
            .field("backends", &self.backends)
            .field("locale", &self.locale)
            .finish_non_exhaustive()
    }
}

/// The session layer, as seen from the gate.
pub trait SessionHandoff: Send + Sync {
    /// Players currently in sessions, for the server-full check.
    fn online_players(&self) -> usize;

    /// Take ownership of an admitted connection.
    fn promote(&self, session: PendingSession);
}

/// Handoff used when no session layer is attached: admitted logins are
/// told so and closed. Status pings are closed silently.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSessionLayer;

impl SessionHandoff for NoSessionLayer {
    fn online_players(&self) -> usize {
        0
    }

    fn promote(&self, session: PendingSession) {
        let reason = Component::translatable("gate.kick.no-session-layer").color(NamedColor::Red);
        if session.connection.handshake().intent().is_login() {
            session.connection.disconnect(&reason, &session.locale);
        } else {
            session.connection.disconnect_quietly(&reason, &session.locale);
        }
    }
}

impl Gate {
    /// Run one connection through PROXY header, handshake and admission.
    pub async fn handle<S>(&self, stream: S, peer: SocketAddr) -> Result<Outcome, GateError>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let settings = self.settings();
        let (read_half, write_half) = tokio::io::split(stream);
        let mut reader = BufReader::new(read_half);
        let transport = ClientTransport::spawn(write_half, RemoteAddress::Inet(peer));

        let forwarded = if settings.config.listener.proxy_protocol.enabled {
            let timeout = settings.config.listener.proxy_protocol.timeout();
            let header = proxy_protocol::read_header(&mut reader, timeout).await?;
            tracing::debug!(
                peer_addr = %peer,
                client_addr = %header.source,
                version = ?header.version,
                "PROXY header accepted"
            );
            Some(header.source)
        } else {
            None
        };

        let handshake = tokio::time::timeout(
            settings.config.timeouts.read(),
            read_handshake(&mut reader),
        )
        .await
        .map_err(|_| GateError::ReadTimeout)??;

        transport.set_protocol_version(handshake.protocol_version());
        let liveness = Arc::clone(&transport);
        let hostname = clean_virtual_host(handshake.server_address());
        let transport: Arc<dyn Transport> = transport;
        let mut connection = InitialInboundConnection::new(
            transport,
            hostname,
            handshake,
            Arc::clone(&self.translations),
        );
        if let Some(address) = forwarded {
            connection.set_remote_address(address);
        }

        tracing::debug!(
            connection = %connection,
            hostname = ?connection.connected_hostname().map(|addr| addr.to_string()),
            protocol = %connection.protocol_version(),
            intent = ?connection.handshake().intent(),
            "Handshake received"
        );

        let verdict = if connection.protocol_version().is_legacy() {
            Err(Rejection::LegacyClient)
        } else {
            AdmissionPolicy::new(&settings.config.admission, &settings.routes)
                .evaluate(&connection, self.handoff.online_players())
        };

        match verdict {
            Ok(backends) => {
                self.handoff.promote(PendingSession {
                    connection,
                    reader: Box::new(liveness.watch_hangup(reader)),
                    backends,
                    locale: settings.locale.clone(),
                });
                Ok(Outcome::Promoted)
            }
            Err(rejection) => {
                let reason = rejection.reason();
                let legacy_ping = rejection == Rejection::LegacyClient
                    && connection.handshake().intent() == HandshakeIntent::Status;
                if rejection.is_quiet() || legacy_ping {
                    connection.disconnect_quietly(&reason, &settings.locale);
                } else {
                    connection.disconnect(&reason, &settings.locale);
                }
                Ok(Outcome::Rejected(rejection))
            }
        }
    }
}

/// Peek for a pre-netty client, otherwise read and decode the handshake frame.
async fn read_handshake<R>(reader: &mut BufReader<R>) -> Result<Handshake, GateError>
where
    R: AsyncRead + Unpin,
{
    let first = match reader.fill_buf().await {
        Ok([]) => return Err(CodecError::ConnectionClosed.into()),
        Ok(buf) => buf[0],
        Err(e) => return Err(CodecError::Io(e).into()),
    };

    if first == LEGACY_PING || first == LEGACY_LOGIN {
        let intent = if first == LEGACY_PING {
            HandshakeIntent::Status
        } else {
            HandshakeIntent::Login
        };
        return Ok(Handshake::new(ProtocolVersion::LEGACY, "", 0, intent));
    }

    let mut frame = codec::read_frame(reader, MAX_HANDSHAKE_FRAME).await?;
    Ok(Handshake::decode(&mut frame)?)
}
