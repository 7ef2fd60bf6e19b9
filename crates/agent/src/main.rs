//! `snowcheck-agent` -- camera-based snow detection daemon.
//!
//! Periodically fetches a still image from a network camera, measures how
//! much of a fixed region of interest is bright, and reports a binary
//! "snow present" state to Home Assistant.
//!
//! See [`AgentConfig::from_env`] for the environment variables read at
//! startup. A `.env` file in the working directory is honoured.

use std::time::Duration;

use snowcheck_agent::config::AgentConfig;
use snowcheck_agent::engine::DetectionEngine;
use snowcheck_agent::scheduler::Scheduler;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long to wait for an in-flight cycle after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(120);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "snowcheck_agent=info,snowcheck_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Snow detection starting");

    let config = AgentConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    tracing::info!(
        check_interval_secs = config.check_interval.as_secs_f64(),
        brightness_threshold = config.thresholds.brightness,
        snow_ratio_threshold = config.thresholds.snow_ratio,
        polygon = %config.polygon,
        dry_run = config.dry_run,
        snapshot_logging = config.snapshot_logging,
        "Loaded configuration",
    );

    let engine = DetectionEngine::from_config(&config)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to build HTTP clients");
            std::process::exit(1);
        });

    let cancel = CancellationToken::new();
    let scheduler = Scheduler::new(engine, config.check_interval);
    let mut handle = tokio::spawn(scheduler.run(cancel.clone()));

    tokio::select! {
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received, draining current cycle");
            cancel.cancel();
            match tokio::time::timeout(DRAIN_TIMEOUT, &mut handle).await {
                Ok(Ok(cycles)) => tracing::info!(cycles, "Scheduler drained"),
                Ok(Err(e)) => tracing::error!(error = %e, "Scheduler task failed"),
                Err(_) => {
                    tracing::warn!("Timed out waiting for cycle to finish");
                    handle.abort();
                }
            }
        }
        result = &mut handle => {
            // Only reachable if the scheduler task panicked.
            if let Err(e) = result {
                tracing::error!(error = %e, "Scheduler task failed");
                std::process::exit(1);
            }
        }
    }

    tracing::info!("Snow detection stopped");
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
