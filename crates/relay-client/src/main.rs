//! TCP relay client entry point.
//!
//! Connects to the relay server once, then forwards operator-typed lines
//! until the server announces shutdown, the connection breaks, input ends, or
//! the operator interrupts.  Every termination path exits with success
//! status; connectivity failures are reported but are fatal to this process
//! only.

use std::io::Write;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use relay_client::application::send_session::{SendSession, SessionStep};
use relay_client::infrastructure::network::{ClientConfig, ServerLink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // A single optional argument overrides the default loopback target.
    let config = match std::env::args().nth(1) {
        Some(arg) => ClientConfig {
            server_addr: arg.parse().context("invalid server address argument")?,
        },
        None => ClientConfig::default(),
    };

    let link = match ServerLink::connect(config.server_addr).await {
        Ok(link) => link,
        Err(e) => {
            warn!("{e}");
            return Ok(());
        }
    };
    info!("connected to server {}", link.server_addr());
    info!("type messages and press Enter; Ctrl-C to quit");

    let mut session = SendSession::new(link);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("Send> ");
        std::io::stdout().flush().ok();

        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("client terminated");
                break;
            }
            line = lines.next_line() => line,
        };

        let line = match line {
            Ok(Some(line)) => line,
            // End of input, or a console that can no longer be read.
            Ok(None) | Err(_) => break,
        };
        if line.is_empty() {
            continue;
        }

        match session.submit_line(&line).await {
            SessionStep::Sent => {}
            SessionStep::NoticeReceived(text) => {
                info!("[notice] {text}");
                break;
            }
            SessionStep::ServerClosed => {
                warn!("server closed the connection");
                break;
            }
            SessionStep::SendFailed(e) => {
                warn!("server unreachable: {e}");
                break;
            }
        }
    }

    info!("client closed");
    Ok(())
}
