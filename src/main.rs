//! Tank Arena Simulation - headless host
//!
//! Hosts a match at `TICK_RATE` until Ctrl+C, or replays a recorded log when
//! `REPLAY_PATH` is set.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tank_arena_sim::config::Config;
use tank_arena_sim::game::AssetDb;
use tank_arena_sim::host::SimulationHost;
use tank_arena_sim::replay::ReplayLog;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(&config.log_level);

    info!("Starting Tank Arena Simulation");

    let assets = match &config.assets_path {
        Some(path) => AssetDb::load(path)?,
        None => AssetDb::builtin(),
    };
    let assets = Arc::new(assets);

    if let Some(path) = &config.replay_path {
        let log = ReplayLog::load(path)?;
        info!(path = %path.display(), ticks = log.ticks.len(), "Replaying log");
        let outcome = log.run(assets)?;
        println!("{} {}", outcome.ticks, outcome.checksum);
        return Ok(());
    }

    info!(
        tick_rate = config.tick_rate,
        seed = config.match_seed,
        "Hosting match"
    );
    let (host, handle) = SimulationHost::new(assets, config.match_seed, config.tick_rate);
    let task = tokio::spawn(host.run());

    shutdown_signal().await;
    drop(handle);
    let log = task.await?;

    if let Some(path) = &config.record_path {
        log.save(path)?;
    }

    info!("Host shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
