//! The identity of a connection between handshake and promotion.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::transport::Transport;
use super::{ConnectionAssociation, InboundConnection, RemoteAddress, UnresolvedAddress};
use crate::protocol::{DisconnectPacket, Handshake, ProtocolVersion};
use crate::text::{serializer, Component, Locale, TranslationRegistry};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("invalid argument: {0} must not be empty")]
    InvalidArgument(&'static str),
}

/// Who is connecting, to which virtual host, at which protocol version.
///
/// Created once the handshake is parsed, mutated only by the task that owns
/// the connection, and consumed on promotion. Other tasks that need to reject
/// the connection take a [`DisconnectHandle`].
pub struct InitialInboundConnection {
    transport: Arc<dyn Transport>,
    handshake: Handshake,
    cleaned_hostname: String,
    remote_address: RemoteAddress,
    translations: Arc<TranslationRegistry>,
}

/// What the session layer receives on promotion.
#[derive(Debug)]
pub struct ConnectionParts {
    pub transport: Arc<dyn Transport>,
    pub handshake: Handshake,
    pub hostname: String,
    pub remote_address: RemoteAddress,
}

impl InitialInboundConnection {
    /// `cleaned_hostname` may be empty only for clients that declared none.
    pub fn new(
        transport: Arc<dyn Transport>,
        cleaned_hostname: impl Into<String>,
        handshake: Handshake,
        translations: Arc<TranslationRegistry>,
    ) -> Self {
        let remote_address = transport.remote_address();
        Self {
            transport,
            handshake,
            cleaned_hostname: cleaned_hostname.into(),
            remote_address,
            translations,
        }
    }

    pub fn handshake(&self) -> &Handshake {
        &self.handshake
    }

    pub fn translations(&self) -> &Arc<TranslationRegistry> {
        &self.translations
    }

    /// Replace the virtual host, e.g. with one forwarded by a trusted proxy.
    pub fn set_cleaned_hostname(
        &mut self,
        hostname: impl Into<String>,
    ) -> Result<(), IdentityError> {
        let hostname = hostname.into();
        if hostname.is_empty() {
            return Err(IdentityError::InvalidArgument("hostname"));
        }
        self.cleaned_hostname = hostname;
        Ok(())
    }

    /// Replace the client address with one supplied by a trusted upstream.
    pub fn set_remote_address(&mut self, address: RemoteAddress) {
        self.remote_address = address;
    }

    /// Translate `reason`, log it, send it and close.
    pub fn disconnect(&self, reason: &Component, locale: &Locale) {
        let log_as: &dyn ConnectionAssociation = self;
        terminate(&*self.transport, &self.translations, reason, locale, Some(log_as));
    }

    /// Like [`disconnect`](Self::disconnect) without the log line.
    pub fn disconnect_quietly(&self, reason: &Component, locale: &Locale) {
        terminate(&*self.transport, &self.translations, reason, locale, None);
    }

    /// A handle other tasks can use to reject this connection.
    pub fn disconnect_handle(&self) -> DisconnectHandle {
        DisconnectHandle {
            transport: Arc::clone(&self.transport),
            translations: Arc::clone(&self.translations),
            label: self.association_label(),
        }
    }

    pub fn into_parts(self) -> ConnectionParts {
        ConnectionParts {
            transport: self.transport,
            handshake: self.handshake,
            hostname: self.cleaned_hostname,
            remote_address: self.remote_address,
        }
    }
}

impl InboundConnection for InitialInboundConnection {
    fn remote_address(&self) -> RemoteAddress {
        self.remote_address
    }

    fn connected_hostname(&self) -> Option<UnresolvedAddress> {
        if self.cleaned_hostname.is_empty() {
            return None;
        }
        Some(UnresolvedAddress::new(
            self.cleaned_hostname.clone(),
            self.handshake.port(),
        ))
    }

    fn is_active(&self) -> bool {
        self.transport.is_active()
    }

    fn protocol_version(&self) -> ProtocolVersion {
        self.transport.protocol_version()
    }
}

impl ConnectionAssociation for InitialInboundConnection {
    fn association_label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for InitialInboundConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[initial connection] {}", self.remote_address)
    }
}

impl fmt::Debug for InitialInboundConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitialInboundConnection")
            .field("remote_address", &self.remote_address)
            .field("hostname", &self.cleaned_hostname)
            .field("handshake", &self.handshake)
            .finish_non_exhaustive()
    }
}

/// Disconnect-only view of a connection, safe to move to other tasks.
///
/// The log label is captured when the handle is taken.
#[derive(Clone)]
pub struct DisconnectHandle {
    transport: Arc<dyn Transport>,
    translations: Arc<TranslationRegistry>,
    label: String,
}

impl DisconnectHandle {
    pub fn is_active(&self) -> bool {
        self.transport.is_active()
    }

    pub fn disconnect(&self, reason: &Component, locale: &Locale) {
        let log_as: &dyn ConnectionAssociation = self;
        terminate(&*self.transport, &self.translations, reason, locale, Some(log_as));
    }

    pub fn disconnect_quietly(&self, reason: &Component, locale: &Locale) {
        terminate(&*self.transport, &self.translations, reason, locale, None);
    }
}

impl ConnectionAssociation for DisconnectHandle {
    fn association_label(&self) -> String {
        self.label.clone()
    }
}

impl fmt::Debug for DisconnectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisconnectHandle")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Render `reason`, hand the packet to the transport, then log.
///
/// The log line follows `close_with` rather than preceding it: only the call
/// that actually started the close may log, and the transport is what decides
/// that. Racing or repeated disconnects therefore produce one line.
fn terminate(
    transport: &dyn Transport,
    translations: &TranslationRegistry,
    reason: &Component,
    locale: &Locale,
    log_as: Option<&dyn ConnectionAssociation>,
) {
    let translated = translations.render(reason, locale);
    let packet = DisconnectPacket::create(&translated, transport.protocol_version());
    if !transport.close_with(packet) {
        return;
    }
    if let Some(connection) = log_as {
        tracing::info!(
            reason = %serializer::plain(&translated),
            "{} has disconnected",
            connection.association_label()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::HandshakeIntent;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct FakeTransport {
        closed: AtomicBool,
        sent: Mutex<Vec<DisconnectPacket>>,
    }

    impl Transport for FakeTransport {
        fn remote_address(&self) -> RemoteAddress {
            RemoteAddress::Inet("198.51.100.4:51000".parse().unwrap())
        }

        fn is_active(&self) -> bool {
            !self.closed.load(Ordering::SeqCst)
        }

        fn protocol_version(&self) -> ProtocolVersion {
            ProtocolVersion::new(765)
        }

        fn close_with(&self, packet: DisconnectPacket) -> bool {
            if self.closed.swap(true, Ordering::SeqCst) {
                return false;
            }
            self.sent.lock().unwrap().push(packet);
            true
        }
    }

    fn identity(hostname: &str) -> (Arc<FakeTransport>, InitialInboundConnection) {
        let transport = Arc::new(FakeTransport::default());
        let handshake = Handshake::new(
            ProtocolVersion::new(765),
            hostname,
            25565,
            HandshakeIntent::Login,
        );
        let connection = InitialInboundConnection::new(
            transport.clone(),
            hostname,
            handshake,
            Arc::new(TranslationRegistry::with_defaults()),
        );
        (transport, connection)
    }

    #[test]
    fn hostname_pairs_with_handshake_port() {
        let (_, connection) = identity("play.example.com");
        assert_eq!(
            connection.connected_hostname(),
            Some(UnresolvedAddress::new("play.example.com", 25565))
        );
    }

    #[test]
    fn empty_hostname_is_absent() {
        let (_, connection) = identity("");
        assert_eq!(connection.connected_hostname(), None);
    }

    #[test]
    fn rejects_empty_hostname_without_mutating() {
        let (_, mut connection) = identity("a.example.com");
        assert_eq!(
            connection.set_cleaned_hostname(""),
            Err(IdentityError::InvalidArgument("hostname"))
        );
        assert_eq!(connection.connected_hostname().unwrap().host(), "a.example.com");
    }

    #[test]
    fn hostname_update_is_visible_immediately() {
        let (_, mut connection) = identity("a.example.com");
        connection.set_cleaned_hostname("play.example.com").unwrap();
        assert_eq!(connection.connected_hostname().unwrap().host(), "play.example.com");
    }

    #[test]
    fn remote_address_rewrite() {
        let (_, mut connection) = identity("a.example.com");
        let real = RemoteAddress::Inet("203.0.113.50:1234".parse().unwrap());
        connection.set_remote_address(real);
        assert_eq!(connection.remote_address(), real);
        assert_eq!(connection.to_string(), "[initial connection] 203.0.113.50:1234");

        connection.set_remote_address(RemoteAddress::Unknown);
        assert_eq!(connection.remote_address(), RemoteAddress::Unknown);
    }

    #[test]
    fn disconnect_sends_translated_json_once() {
        let (transport, connection) = identity("a.example.com");
        assert!(connection.is_active());
        let reason = Component::translatable("gate.kick.server-full");
        connection.disconnect(&reason, &Locale::en_us());
        connection.disconnect_quietly(&reason, &Locale::en_us());

        assert!(!connection.is_active());
        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], DisconnectPacket::Json(r#"{"text":"The server is full."}"#.into()));
    }

    #[test]
    fn handle_shares_transport() {
        let (transport, connection) = identity("a.example.com");
        let handle = connection.disconnect_handle();
        assert_eq!(handle.association_label(), "[initial connection] 198.51.100.4:51000");
        handle.disconnect_quietly(&Component::text("bye"), &Locale::en_us());
        assert!(!connection.is_active());
        assert_eq!(transport.sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn into_parts_keeps_enrichment() {
        let (_, mut connection) = identity("a.example.com");
        connection.set_cleaned_hostname("b.example.com").unwrap();
        let parts = connection.into_parts();
        assert_eq!(parts.hostname, "b.example.com");
        assert_eq!(parts.handshake.port(), 25565);
    }
}
