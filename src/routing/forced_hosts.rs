//! Virtual-host based backend selection.
//!
//! # Responsibilities
//! - Match the declared virtual host (exact match, case-insensitive)
//! - Fall back to the default try list
//!
//! # Design Decisions
//! - Built once per configuration, immutable afterwards
//! - O(1) host lookup via HashMap
//! - The port is ignored: one listener serves every virtual host

use std::collections::HashMap;

use crate::config::RoutingConfig;
use crate::connection::UnresolvedAddress;

#[derive(Debug, Clone, Default)]
pub struct ForcedHosts {
    hosts: HashMap<String, Vec<String>>,
    try_servers: Vec<String>,
}

impl ForcedHosts {
    /// Host names are normalised to lowercase.
    pub fn new(hosts: HashMap<String, Vec<String>>, try_servers: Vec<String>) -> Self {
        let hosts = hosts
            .into_iter()
            .map(|(host, backends)| (host.to_lowercase(), backends))
            .collect();
        Self { hosts, try_servers }
    }

    pub fn from_config(config: &RoutingConfig) -> Self {
        Self::new(config.forced_hosts.clone(), config.try_servers.clone())
    }

    /// Backends forced for this exact host, if any.
    pub fn forced(&self, host: &str) -> Option<&[String]> {
        self.hosts.get(&host.to_lowercase()).map(Vec::as_slice)
    }

    /// Ordered backend candidates for a connection.
    pub fn select(&self, hostname: Option<&UnresolvedAddress>) -> Option<&[String]> {
        hostname
            .and_then(|addr| self.forced(addr.host()))
            .or_else(|| (!self.try_servers.is_empty()).then_some(self.try_servers.as_slice()))
    }
}
