//! ChatKit Session Relay
//!
//! Issues ChatKit client secrets to browsers without exposing the API key.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────┐
//!                      │                    SESSION RELAY                      │
//!                      │                                                       │
//!   Browser Request    │  ┌──────────┐   ┌──────────┐   ┌──────────────────┐   │
//!   ───────────────────┼─▶│ request  │──▶│  cors    │──▶│ session handler  │   │
//!                      │  │ id+trace │   │  gate    │   │ validate+resolve │   │
//!                      │  └──────────┘   └────┬─────┘   └────────┬─────────┘   │
//!                      │                      │ 403/204          │             │
//!                      │                      ▼                  ▼             │
//!   Browser Response   │               short-circuit     ┌──────────────────┐   │   ChatKit
//!   ◀──────────────────┼───────────────────────────────── │ session gateway  │◀──┼── Sessions
//!                      │                                  │  (15s deadline)  │──▶│   API
//!                      │                                  └──────────────────┘   │
//!                      └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use chatkit_session_relay::config;
use chatkit_session_relay::lifecycle::{spawn_signal_listener, Shutdown};
use chatkit_session_relay::observability::{logging, metrics};
use chatkit_session_relay::{HttpServer, OpenAiSessionGateway};

#[derive(Parser)]
#[command(name = "chatkit-session-relay")]
#[command(about = "Relay that creates ChatKit sessions for browser clients", long_about = None)]
struct Args {
    /// Optional TOML config file; environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match config::load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            logging::init(&Default::default());
            tracing::error!(error = %e, "Refusing to start");
            return Err(e.into());
        }
    };
    logging::init(&config.observability);

    tracing::info!("chatkit-session-relay v{} starting", env!("CARGO_PKG_VERSION"));
    logging::log_config(&config);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let gateway = OpenAiSessionGateway::new(&config.upstream).map_err(|e| {
        tracing::error!(error = %e, "Failed to initialize session gateway");
        e
    })?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(config, Arc::new(gateway));
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
