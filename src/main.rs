//! tinystatus - service status monitor
//!
//! Probes HTTP endpoints, TCP ports and ICMP reachability, keeps a short
//! history per service and sends a Telegram message when a status flips.

mod alert;
mod config;
mod history;
mod probe;
mod scheduler;
mod snapshot;
mod web;

use config::MonitorConfig;
use scheduler::Monitor;
use web::Server;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("tinystatus=info".parse()?))
        .init();

    // Load configuration
    let cfg = MonitorConfig::load()?;
    cfg.log_summary();
    std::fs::create_dir_all(&cfg.html_output_directory)?;

    let monitor = Monitor::from_config(cfg.clone())?;

    // Start web server
    if let Some(port) = cfg.port {
        let server = Server::new(port, cfg.html_output_directory.clone(), monitor.snapshots());
        tokio::spawn(async move {
            if let Err(e) = server.start().await {
                tracing::error!("Web server failed: {}", e);
            }
        });
    }

    // Runs until a fatal configuration error
    monitor.run().await?;

    Ok(())
}
