//! Admission checks run between handshake and promotion.
//!
//! # Order
//! ```text
//! banned address      → quiet disconnect (probing is not worth a log line)
//! transfer disabled   → disconnect
//! unsupported version → disconnect (login and transfer only)
//! server full         → disconnect (login and transfer only)
//! unknown host        → disconnect (only with require_known_host)
//! ```

use crate::config::AdmissionConfig;
use crate::connection::{InboundConnection, InitialInboundConnection, RemoteAddress};
use crate::protocol::{HandshakeIntent, ProtocolVersion};
use crate::routing::ForcedHosts;
use crate::text::{Component, NamedColor};

/// Why a connection was turned away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Banned,
    LegacyClient,
    TransfersDisabled,
    UnsupportedVersion(ProtocolVersion),
    ServerFull,
    UnknownHost(String),
}

impl Rejection {
    /// The message sent to the client, still untranslated.
    pub fn reason(&self) -> Component {
        let reason = match self {
            Rejection::Banned => Component::translatable("gate.kick.banned"),
            Rejection::LegacyClient => Component::translatable("gate.kick.legacy-client"),
            Rejection::TransfersDisabled => Component::translatable("gate.kick.transfers-disabled"),
            Rejection::UnsupportedVersion(_) => Component::translatable_with(
                "gate.kick.outdated-client",
                vec![Component::text(ProtocolVersion::supported_range())],
            ),
            Rejection::ServerFull => Component::translatable("gate.kick.server-full"),
            Rejection::UnknownHost(host) => Component::translatable_with(
                "gate.kick.unknown-host",
                vec![Component::text(host.clone())],
            ),
        };
        reason.color(NamedColor::Red)
    }

    /// Rejections that are not logged.
    pub fn is_quiet(&self) -> bool {
        matches!(self, Rejection::Banned)
    }
}

/// Evaluates one connection against the live configuration.
#[derive(Debug, Clone, Copy)]
pub struct AdmissionPolicy<'a> {
    config: &'a AdmissionConfig,
    routes: &'a ForcedHosts,
}

impl<'a> AdmissionPolicy<'a> {
    pub fn new(config: &'a AdmissionConfig, routes: &'a ForcedHosts) -> Self {
        Self { config, routes }
    }

    pub fn is_banned(&self, address: RemoteAddress) -> bool {
        address
            .socket_addr()
            .is_some_and(|addr| self.config.banned_addresses.contains(&addr.ip()))
    }

    /// Backend candidates on admission, the rejection otherwise.
    pub fn evaluate(
        &self,
        connection: &InitialInboundConnection,
        online_players: usize,
    ) -> Result<Vec<String>, Rejection> {
        if self.is_banned(connection.remote_address()) {
            return Err(Rejection::Banned);
        }

        let hostname = connection.connected_hostname();
        let backends = self.routes.select(hostname.as_ref()).map(<[String]>::to_vec);

        let intent = connection.handshake().intent();
        if !intent.is_login() {
            return Ok(backends.unwrap_or_default());
        }

        if intent == HandshakeIntent::Transfer && !self.config.accept_transfers {
            return Err(Rejection::TransfersDisabled);
        }
        let version = connection.protocol_version();
        if !version.is_supported() {
            return Err(Rejection::UnsupportedVersion(version));
        }
        if self.config.max_players > 0 && online_players >= self.config.max_players {
            return Err(Rejection::ServerFull);
        }

        let forced = hostname
            .as_ref()
            .and_then(|addr| self.routes.forced(addr.host()));
        if self.config.require_known_host && forced.is_none() {
            let host = hostname.map(|addr| addr.host().to_string()).unwrap_or_default();
            return Err(Rejection::UnknownHost(host));
        }

        Ok(backends.unwrap_or_default())
    }
}
