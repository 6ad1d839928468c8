//! Subdomain router server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request ──▶ request id ──▶ trace span ──▶ timeout
//!                                                         │
//!                                                         ▼
//!                                              subdomain middleware
//!                                         (Host → label → SubdomainContext)
//!                                                         │
//!                                                         ▼
//!                                                     dispatch
//!                                    (context table, or the root table)
//!                                                         │
//!                                                         ▼
//!     Client Response ◀───────────────────────── table router
//!                                    (routes, /_reverse/{route}, append slash)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use subdomain_router::config::load_config;
use subdomain_router::lifecycle::{spawn_signal_listener, Shutdown};
use subdomain_router::observability::{logging, metrics};
use subdomain_router::HttpServer;

#[derive(Parser)]
#[command(name = "subdomain-router")]
#[command(about = "Serve URL tables selected by request subdomain", long_about = None)]
struct Args {
    /// Site configuration file (TOML).
    #[arg(short, long, default_value = "site.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args.config)?;

    logging::init_logging(&config.observability)?;
    tracing::info!("subdomain-router v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        path = %args.config.display(),
        domain = %config.site.domain,
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(err) = metrics::init_metrics(addr) {
                    tracing::error!(error = %err, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = HttpServer::new(&config)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let stopped = shutdown.subscribe();
    spawn_signal_listener(shutdown);

    server.run(listener, stopped).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
