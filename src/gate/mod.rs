//! Pre-authentication gate.
//!
//! # Data Flow
//! ```text
//! Accepted socket
//!     → handler.rs (PROXY header, handshake, identity)
//!     → admission.rs (ban list, version window, capacity, virtual host)
//!     → SessionHandoff::promote (identity consumed)
//!       or identity.disconnect (transport closed)
//! ```
//!
//! # Design Decisions
//! - Live settings are swapped atomically on reload; a connection keeps the
//!   snapshot it started with
//! - Disconnect messages use the configured display locale

pub mod admission;
pub mod handler;

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::{broadcast, mpsc};

use crate::config::GateConfig;
use crate::net::{ConnectionTracker, Listener, ListenerError};
use crate::routing::ForcedHosts;
use crate::text::{Locale, TranslationRegistry};

pub use admission::{AdmissionPolicy, Rejection};
pub use handler::{GateError, NoSessionLayer, Outcome, PendingSession, SessionHandoff};

/// Everything derived from one configuration version.
#[derive(Debug)]
pub struct GateSettings {
    pub config: GateConfig,
    pub routes: ForcedHosts,
    pub locale: Locale,
}

impl GateSettings {
    pub fn new(config: GateConfig) -> Self {
        Self {
            routes: ForcedHosts::from_config(&config.routing),
            locale: config.messages.display_locale(),
            config,
        }
    }
}

pub struct Gate {
    settings: ArcSwap<GateSettings>,
    translations: Arc<TranslationRegistry>,
    tracker: ConnectionTracker,
    handoff: Arc<dyn SessionHandoff>,
}

impl Gate {
    pub fn new(config: GateConfig, handoff: Arc<dyn SessionHandoff>) -> Self {
        let translations = Arc::new(TranslationRegistry::with_defaults());
        register_overrides(&translations, &config);
        Self {
            settings: ArcSwap::from_pointee(GateSettings::new(config)),
            translations,
            tracker: ConnectionTracker::new(),
            handoff,
        }
    }

    /// Snapshot of the live settings.
    pub fn settings(&self) -> Arc<GateSettings> {
        self.settings.load_full()
    }

    pub fn translations(&self) -> &Arc<TranslationRegistry> {
        &self.translations
    }

    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    /// Swap in a new configuration. Listener settings need a restart.
    pub fn reload(&self, config: GateConfig) {
        register_overrides(&self.translations, &config);
        let settings = GateSettings::new(config);
        tracing::info!(
            locale = %settings.locale,
            forced_hosts = settings.config.routing.forced_hosts.len(),
            banned = settings.config.admission.banned_addresses.len(),
            "Gate settings reloaded"
        );
        self.settings.store(Arc::new(settings));
    }

    /// Apply configuration updates until the channel closes.
    pub async fn apply_updates(&self, mut updates: mpsc::UnboundedReceiver<GateConfig>) {
        while let Some(config) = updates.recv().await {
            self.reload(config);
        }
    }

    /// Accept connections until shutdown is signalled.
    pub async fn run(
        self: Arc<Self>,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ListenerError> {
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, no longer accepting connections");
                    break;
                }
                accepted = listener.accept() => {
                    let (stream, peer, permit) = match accepted {
                        Ok(accepted) => accepted,
                        Err(ListenerError::Accept(e)) => {
                            tracing::warn!(error = %e, "Accept failed");
                            continue;
                        }
                        Err(e) => return Err(e),
                    };
                    let guard = self.tracker.track();
                    let gate = Arc::clone(&self);
                    tokio::spawn(async move {
                        let _permit = permit;
                        match gate.handle(stream, peer).await {
                            Ok(outcome) => tracing::debug!(
                                connection_id = %guard.id(),
                                peer_addr = %peer,
                                outcome = ?outcome,
                                "Pre-authentication finished"
                            ),
                            Err(e) => tracing::debug!(
                                connection_id = %guard.id(),
                                peer_addr = %peer,
                                error = %e,
                                "Connection dropped before admission"
                            ),
                        }
                    });
                }
            }
        }
        Ok(())
    }
}

fn register_overrides(translations: &TranslationRegistry, config: &GateConfig) {
    for (tag, messages) in &config.messages.translations {
        match tag.parse::<Locale>() {
            Ok(locale) => translations.register_bundle(locale, messages.clone()),
            Err(e) => tracing::warn!(error = %e, "Skipping translations"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::{serializer, Component};

    struct Nobody;

    impl SessionHandoff for Nobody {
        fn online_players(&self) -> usize {
            0
        }
        fn promote(&self, _session: PendingSession) {}
    }

    #[test]
    fn reload_swaps_settings_and_translations() {
        let gate = Gate::new(GateConfig::default(), Arc::new(Nobody));
        assert_eq!(gate.settings().locale, Locale::en_us());

        let mut config = GateConfig::default();
        config.messages.locale = "de_DE".into();
        config
            .messages
            .translations
            .entry("de".into())
            .or_default()
            .insert("gate.kick.server-full".into(), "Der Server ist voll.".into());
        config.admission.max_players = 3;
        gate.reload(config);

        let settings = gate.settings();
        assert_eq!(settings.locale.to_string(), "de_DE");
        assert_eq!(settings.config.admission.max_players, 3);
        let rendered = gate
            .translations()
            .render(&Component::translatable("gate.kick.server-full"), &settings.locale);
        assert_eq!(serializer::plain(&rendered), "Der Server ist voll.");
    }
}
