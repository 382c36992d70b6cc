//! Configuration schema definitions.
//!
//! All sections default, so an empty file is a valid configuration.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::text::Locale;

/// Root configuration for the gate.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct GateConfig {
    pub listener: ListenerConfig,

    pub timeouts: TimeoutConfig,

    /// Who is let through to the session layer.
    pub admission: AdmissionConfig,

    /// Virtual host → backend selection.
    pub routing: RoutingConfig,

    /// Disconnect message locale and translation overrides.
    pub messages: MessagesConfig,

    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:25577").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,

    pub proxy_protocol: ProxyProtocolConfig,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:25577".to_string(),
            max_connections: 10_000,
            proxy_protocol: ProxyProtocolConfig::default(),
        }
    }
}

/// PROXY protocol settings. Enable only behind a trusted load balancer.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ProxyProtocolConfig {
    pub enabled: bool,

    /// Timeout for reading the PROXY header in seconds.
    pub timeout_secs: u64,
}

impl Default for ProxyProtocolConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_secs: 5,
        }
    }
}

impl ProxyProtocolConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed for the client to send its handshake, in seconds.
    pub read_secs: u64,

    /// How long shutdown waits for in-flight connections, in seconds.
    pub shutdown_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            read_secs: 30,
            shutdown_secs: 10,
        }
    }
}

impl TimeoutConfig {
    pub fn read(&self) -> Duration {
        Duration::from_secs(self.read_secs)
    }

    pub fn shutdown(&self) -> Duration {
        Duration::from_secs(self.shutdown_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Player cap enforced at login; 0 disables the check.
    pub max_players: usize,

    /// Accept handshakes with the transfer intent.
    pub accept_transfers: bool,

    /// Reject logins whose virtual host selects no backend.
    pub require_known_host: bool,

    /// Client addresses rejected before anything else happens.
    pub banned_addresses: Vec<IpAddr>,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_players: 500,
            accept_transfers: false,
            require_known_host: false,
            banned_addresses: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RoutingConfig {
    /// Backends tried when no forced host matches.
    #[serde(rename = "try")]
    pub try_servers: Vec<String>,

    /// Virtual host → ordered backend names.
    pub forced_hosts: HashMap<String, Vec<String>>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            try_servers: vec!["lobby".to_string()],
            forced_hosts: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct MessagesConfig {
    /// Locale disconnect messages are rendered in (e.g. "en_US").
    pub locale: String,

    /// Per-locale message overrides: locale → key → pattern.
    pub translations: HashMap<String, HashMap<String, String>>,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            locale: "en_US".to_string(),
            translations: HashMap::new(),
        }
    }
}

impl MessagesConfig {
    /// The configured display locale; `en_US` if it does not parse.
    pub fn display_locale(&self) -> Locale {
        self.locale.parse().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of text.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}
