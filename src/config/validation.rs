//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0)
//! - Check that every forced host names at least one backend
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Pure function: GateConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;

use super::schema::GateConfig;
use crate::text::Locale;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),
    #[error("listener.max_connections must be greater than zero")]
    ZeroMaxConnections,
    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
    #[error("{field} {value:?} is not a locale tag")]
    Locale { field: &'static str, value: String },
    #[error("forced host {0:?} lists no backends")]
    EmptyForcedHost(String),
    #[error("forced host names must not be empty")]
    BlankForcedHost,
    #[error("backend names must not be empty")]
    BlankBackend,
}

pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroMaxConnections);
    }
    if config.listener.proxy_protocol.enabled && config.listener.proxy_protocol.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("listener.proxy_protocol.timeout_secs"));
    }
    if config.timeouts.read_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.read_secs"));
    }

    if config.messages.locale.parse::<Locale>().is_err() {
        errors.push(ValidationError::Locale {
            field: "messages.locale",
            value: config.messages.locale.clone(),
        });
    }
    for tag in config.messages.translations.keys() {
        if tag.parse::<Locale>().is_err() {
            errors.push(ValidationError::Locale {
                field: "messages.translations",
                value: tag.clone(),
            });
        }
    }

    for (host, backends) in &config.routing.forced_hosts {
        if host.trim().is_empty() {
            errors.push(ValidationError::BlankForcedHost);
        }
        if backends.is_empty() {
            errors.push(ValidationError::EmptyForcedHost(host.clone()));
        }
    }
    let all_backends = config
        .routing
        .forced_hosts
        .values()
        .flatten()
        .chain(&config.routing.try_servers);
    if all_backends.into_iter().any(|name| name.trim().is_empty()) {
        errors.push(ValidationError::BlankBackend);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
