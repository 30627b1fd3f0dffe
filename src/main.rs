//! Recipe Cache - composition binary
//!
//! Wires a cache facade and a recurring stats report together the way a
//! data-loading pipeline would, then runs until interrupted.

use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recipe_cache::{Config, RecipeCache, RecurringTask, TimeUnit};

/// Main entry point.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache facade with the configured capacity
/// 4. Start the recurring stats report
/// 5. Stop the report on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recipe_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Recipe Cache");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_cache_size={}, stats_initial_delay={}s, stats_interval={}s",
        config.max_cache_size, config.stats_initial_delay, config.stats_interval
    );

    let cache: RecipeCache<serde_json::Value> = RecipeCache::new(config.max_cache_size);
    info!(max_size = cache.max_cache_size(), "Cache initialized");

    let report_cache = cache.clone();
    let report = RecurringTask::builder()
        .name("cache-stats")
        .task(move || -> anyhow::Result<()> {
            let stats = report_cache.stats();
            info!(
                entries = stats.total_entries,
                size = report_cache.cache_size(),
                hits = stats.hits,
                misses = stats.misses,
                evictions = stats.evictions,
                hit_rate = stats.hit_rate(),
                "cache stats"
            );
            Ok(())
        })
        .initial_delay(config.stats_initial_delay as i64)
        .interval(config.stats_interval as i64)
        .unit(TimeUnit::Seconds)
        .build()?;
    let report_handle = report.start()?;
    info!("Stats report started");

    shutdown_signal().await;

    report_handle.stop();
    let final_stats = report_handle.stats();
    info!(
        reports = final_stats.executions,
        failures = final_stats.failures,
        "Shutdown complete"
    );
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
