//! FSD Observer - live position relay for an FSD network feed

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fsd_observer::config::{flag_enabled, mask_secret};
use fsd_observer::{Config, Observer};

#[tokio::main]
async fn main() -> Result<()> {
    let debug_rx = flag_enabled(std::env::var("FSD_DEBUG_RX").ok().as_deref(), false);
    init_tracing(debug_rx);

    info!("===========================================");
    info!("   FSD Observer - live position relay");
    info!("===========================================");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return Err(e).context("invalid configuration");
        }
    };

    info!("Configuration:");
    info!("  Feed: {}", config.feed_addr());
    info!("  Login: {}", config.login.login.redacted_line());
    info!("  Presence line: {}", config.login.presence.is_some());
    info!("  Collector: {}", config.push_url);
    info!("  Collector token: {}", mask_secret(&config.push_token));
    info!("  Push interval: {:?}", config.push_interval);
    info!("  Connect timeout: {:?}", config.connect_timeout);
    info!("  Read timeout: {:?}", config.read_timeout);
    info!("  Debug RX: {}", config.debug_rx);

    let observer =
        Observer::with_http_collector(config).context("failed to build collector client")?;

    info!("Starting observer. Press Ctrl+C to stop.");

    tokio::select! {
        _ = observer.run() => {}
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for shutdown signal")?;
            info!("Shutdown requested");
        }
    }

    info!(
        "Shutdown complete. {} | Tracked: {}",
        observer.stats().summary(),
        observer.table().len()
    );
    Ok(())
}

fn init_tracing(debug_rx: bool) {
    let default_level = if debug_rx { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fsd_observer={default_level},warn")));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
