//! note-relay server
//!
//! Serves the relay path and forwards every request to the backend named
//! by the control header, or to the configured default target.
//!
//! ```text
//!     Client Request            ┌──────────────────────────────────────────┐
//!     ──────────────────────────┼─▶ /api/proxy/{*path}                      │
//!                               │     → request id, trace                  │
//!                               │     → ProxyGateway (sanitize, stream)    │──▶ Backend
//!     Client Response           │     ← status, reason, headers, body      │◀──
//!     ◀─────────────────────────┼──                                        │
//!                               └──────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use note_relay::config::load_or_default;
use note_relay::lifecycle::Shutdown;
use note_relay::observability::init_logging;
use note_relay::RelayServer;

#[derive(Parser)]
#[command(name = "note-relay")]
#[command(about = "Relay gateway for a note-indexing backend", long_about = None)]
struct Args {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_or_default(args.config.as_deref())?;
    init_logging(config.observability.log_format)?;

    tracing::info!("note-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        path_prefix = %config.relay.path_prefix,
        default_target = %config.relay.default_target,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let server = RelayServer::new(&config.relay)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
