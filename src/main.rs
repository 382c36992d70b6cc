//! Inbound gate (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!     Client socket
//!     ─────────────▶ net::listener ──▶ gate::handler ──▶ gate::admission
//!                    (permits)         (PROXY header,      (bans, versions,
//!                                       handshake,          capacity, hosts)
//!                                       identity)                │
//!                                                                ▼
//!                                          promote ◀──── verdict ────▶ disconnect
//!                                       (session layer)            (localized, per
//!                                                                   protocol version)
//!
//!     Cross-cutting: config (+ watcher), observability, lifecycle
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use inbound_gate::config::{load_config, ConfigWatcher, GateConfig};
use inbound_gate::gate::{Gate, NoSessionLayer};
use inbound_gate::lifecycle::{self, Shutdown};
use inbound_gate::net::Listener;
use inbound_gate::observability;

#[derive(Parser)]
#[command(name = "inbound-gate")]
#[command(about = "Pre-authentication gate for Minecraft clients", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GateConfig::default(),
    };

    if cli.check {
        println!("Configuration OK");
        return Ok(());
    }

    observability::init(&config.observability)?;
    tracing::info!("inbound-gate v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        proxy_protocol = config.listener.proxy_protocol.enabled,
        locale = %config.messages.locale,
        "Configuration loaded"
    );

    let listener = Listener::bind(&config.listener).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown_timeout = config.timeouts.shutdown();
    let gate = Arc::new(Gate::new(config.clone(), Arc::new(NoSessionLayer)));

    // Keep the watcher alive for the lifetime of the process.
    let _watcher = match &cli.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path, config);
            let watcher = watcher.run()?;
            let gate = Arc::clone(&gate);
            tokio::spawn(async move { gate.apply_updates(updates).await });
            Some(watcher)
        }
        None => None,
    };

    let shutdown = Shutdown::new();
    tokio::spawn(lifecycle::wait_for_signal(shutdown.clone()));

    Arc::clone(&gate).run(listener, shutdown.subscribe()).await?;

    shutdown.drain(gate.tracker(), shutdown_timeout).await;
    tracing::info!("Shutdown complete");
    Ok(())
}
