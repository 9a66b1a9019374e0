use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::models::SeenSet;
use crate::plugins::traits::{ListingSource, Notifier};
use crate::store::DedupStore;

/// Counters for one sweep over all configured sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub sources_polled: usize,
    pub sources_failed: usize,
    pub sources_skipped: usize,
    pub listings_returned: usize,
    pub new_listings: usize,
    pub notifications_sent: usize,
    pub delivery_failures: usize,
    pub persist_failures: usize,
}

impl CycleReport {
    pub fn is_clean(&self) -> bool {
        self.sources_failed == 0 && self.delivery_failures == 0 && self.persist_failures == 0
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct FailureState {
    consecutive: u32,
    skip_remaining: u32,
}

/// Per-source skip schedule after repeated fetch failures. With a cap of 0
/// nothing is ever skipped.
#[derive(Debug, Default)]
pub struct SourceBackoff {
    max_cycles: u32,
    failures: HashMap<String, FailureState>,
}

impl SourceBackoff {
    pub fn new(max_cycles: u32) -> Self {
        Self {
            max_cycles,
            failures: HashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_cycles > 0
    }

    /// Consumes one skipped cycle if the source is currently backing off.
    fn should_skip(&mut self, url: &str) -> bool {
        match self.failures.get_mut(url) {
            Some(state) if state.skip_remaining > 0 => {
                state.skip_remaining -= 1;
                true
            }
            _ => false,
        }
    }

    fn record_failure(&mut self, url: &str) -> u32 {
        if !self.is_enabled() {
            return 0;
        }
        let state = self.failures.entry(url.to_string()).or_default();
        state.consecutive = state.consecutive.saturating_add(1);
        let exp = state.consecutive.saturating_sub(1).min(31);
        state.skip_remaining = (1u32 << exp).min(self.max_cycles);
        state.skip_remaining
    }

    fn record_success(&mut self, url: &str) {
        self.failures.remove(url);
    }
}

/// One sweep: fetch every source in order, notify unseen listings one by one,
/// and record each successful notification before moving on.
pub struct PollCycle {
    source: Arc<dyn ListingSource>,
    notifier: Arc<dyn Notifier>,
    store: DedupStore,
    seen: SeenSet,
    urls: Vec<String>,
    destination: String,
    backoff: SourceBackoff,
}

impl PollCycle {
    pub fn new(
        source: Arc<dyn ListingSource>,
        notifier: Arc<dyn Notifier>,
        store: DedupStore,
        seen: SeenSet,
        urls: Vec<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            source,
            notifier,
            store,
            seen,
            urls,
            destination: destination.into(),
            backoff: SourceBackoff::default(),
        }
    }

    pub fn with_backoff(mut self, max_cycles: u32) -> Self {
        self.backoff = SourceBackoff::new(max_cycles);
        self
    }

    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub async fn run(&mut self) -> CycleReport {
        let mut report = CycleReport::default();

        for url in &self.urls {
            if self.backoff.should_skip(url) {
                tracing::debug!(url = %url, "Source backing off, skipped this cycle");
                report.sources_skipped += 1;
                continue;
            }

            let listings = match self.source.fetch(url).await {
                Ok(listings) => {
                    self.backoff.record_success(url);
                    listings
                }
                Err(e) => {
                    report.sources_failed += 1;
                    let skip = self.backoff.record_failure(url);
                    tracing::warn!(url = %url, error = %e, skip_cycles = skip, "Failed to fetch listings");
                    continue;
                }
            };

            report.sources_polled += 1;
            report.listings_returned += listings.len();

            for listing in listings {
                if self.seen.contains(&listing.link) {
                    continue;
                }
                report.new_listings += 1;

                if !listing.has_link() {
                    tracing::debug!(title = %listing.title, "Listing has no link, identified by placeholder");
                }

                let message = listing.notification_text();
                if let Err(e) = self.notifier.deliver(&self.destination, &message).await {
                    report.delivery_failures += 1;
                    tracing::warn!(link = %listing.link, error = %e, "Failed to deliver notification, will retry next cycle");
                    continue;
                }
                report.notifications_sent += 1;

                match self.store.commit(&mut self.seen, &listing.link) {
                    Ok(_) => {
                        tracing::info!(link = %listing.link, title = %listing.title, "Notified new listing");
                    }
                    Err(e) => {
                        report.persist_failures += 1;
                        tracing::error!(
                            link = %listing.link,
                            error = %e,
                            "Notification sent but could not be recorded; it may be sent again"
                        );
                    }
                }
            }
        }

        report
    }
}
