//! TCP relay server entry point.
//!
//! Wires together configuration, logging, the relay server, and the shutdown
//! signal, then blocks on the multiplex loop.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()          -- TOML from the platform config dir
//!  └─ RelayServer::bind()    -- listener + event channel
//!  └─ spawn Ctrl-C task      -- feeds the watch-channel shutdown signal
//!  └─ spawn event pump       -- ServerEvent -> MessageLog console output
//!  └─ server.run().await     -- the multiplex loop, until shutdown
//! ```

use anyhow::Context;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use relay_server::application::observe_messages::MessageLog;
use relay_server::infrastructure::network::relay_server::{RelayServer, ServerEvent};
use relay_server::infrastructure::storage::config::load_config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Bind/listen/config failures are fatal before the loop starts; anyhow
    // prints the diagnostic chain and the process exits with failure status.
    let config = load_config().context("failed to load configuration")?;

    // Initialise structured logging.  `RUST_LOG` overrides the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    let (server, mut events) = RelayServer::bind(&config.network)
        .await
        .context("failed to start listener")?;
    let addr = server.local_addr().context("listener has no local address")?;
    info!("relay server listening on {addr} (press Ctrl-C to stop)");

    // ── Shutdown signal ───────────────────────────────────────────────────────
    // Ctrl-C flips the watch channel, which wakes the multiplex loop between
    // two dispatch passes.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    // ── Server event pump ─────────────────────────────────────────────────────
    tokio::spawn(async move {
        let mut log = MessageLog::new();
        while let Some(event) = events.recv().await {
            match event {
                ServerEvent::PeerConnected { peer_addr, .. } => log.peer_connected(peer_addr),
                ServerEvent::MessageReceived {
                    peer_addr, payload, ..
                } => log.message_received(peer_addr, &payload),
                ServerEvent::PeerDisconnected { peer_addr, .. } => {
                    log.peer_disconnected(peer_addr)
                }
                ServerEvent::ConnectionRefused { peer_addr, .. } => {
                    log.connection_refused(peer_addr)
                }
                ServerEvent::ShutdownBroadcast { notified } => log.shutdown_broadcast(notified),
            }
        }
    });

    server.run(shutdown_rx).await?;
    info!("server closed");
    Ok(())
}
