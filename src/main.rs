use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};

use listing_watcher::plugins::notifiers::{TelegramNotifier, Throttled};
use listing_watcher::scraper::HttpListingSource;
use listing_watcher::utils::logging;
use listing_watcher::{AppConfig, DedupStore, ListingScheduler, PollCycle};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    let _log_guard = logging::init(config.as_ref().ok().and_then(|c| c.log_dir.as_deref()))?;

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration, not starting");
            return Err(e.into());
        }
    };

    info!(
        urls = config.monitor.urls.len(),
        interval_secs = config.monitor.check_interval.as_secs(),
        state_file = %config.monitor.state_file.display(),
        "Starting listing watcher..."
    );

    let source = HttpListingSource::new(&config.scraper)?;
    let notifier = Throttled::new(
        TelegramNotifier::new(&config.telegram)?,
        config.monitor.delivery_spacing,
    );

    let store = DedupStore::new(&config.monitor.state_file);
    let seen = store.load();

    let cycle = PollCycle::new(
        Arc::new(source),
        Arc::new(notifier),
        store,
        seen,
        config.monitor.urls.clone(),
        config.telegram.chat_id.clone(),
    )
    .with_backoff(config.monitor.max_backoff_cycles);

    let mut scheduler = ListingScheduler::new(cycle, config.monitor.check_interval);
    scheduler
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await;

    info!("Shutting down...");
    Ok(())
}
