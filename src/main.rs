//! Haven relay — a real-time message broker for direct and room chat.

use clap::Parser;
use haven_relay::config::{Args, RelayConfig};
use haven_relay::{cleanup, listener, Hub, Store};
use tracing::{error, info};

/// Haven relay version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("haven_relay=info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    let port = args.port;
    let data_dir = args.data_dir.clone();
    let config = RelayConfig::from(args);

    info!("════════════════════════════════════════════════════════════");
    info!("  Haven relay v{} — starting up", VERSION);
    info!("════════════════════════════════════════════════════════════");
    info!(?data_dir, port, "configuration loaded");

    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        error!(error = %e, "failed to create data directory");
        return;
    }

    let store = match Store::open(&data_dir) {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "failed to open store");
            return;
        }
    };

    let hub = Hub::new(store, config);

    let cleanup_hub = hub.clone();
    tokio::spawn(async move {
        cleanup::run(cleanup_hub).await;
    });

    let serve_hub = hub.clone();
    let server = tokio::spawn(async move {
        if let Err(e) = listener::serve(serve_hub, port).await {
            error!(error = %e, "listener exited with error");
        }
    });

    tokio::select! {
        _ = server => {}
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }
}
