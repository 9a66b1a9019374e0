use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::poll_cycle::{CycleReport, PollCycle};

#[derive(Debug, Clone, Default, Serialize)]
pub struct SchedulerStats {
    pub cycles_run: u64,
    pub notifications_sent: u64,
    pub failed_fetches: u64,
    pub failed_deliveries: u64,
    pub failed_persists: u64,
}

impl SchedulerStats {
    fn record(&mut self, report: &CycleReport) {
        self.cycles_run += 1;
        self.notifications_sent += report.notifications_sent as u64;
        self.failed_fetches += report.sources_failed as u64;
        self.failed_deliveries += report.delivery_failures as u64;
        self.failed_persists += report.persist_failures as u64;
    }
}

/// Drives a [`PollCycle`] forever: sweep, sleep `interval`, repeat.
///
/// A new sweep only starts after the previous one and its sleep are done, so
/// the cycle's state is never touched concurrently.
pub struct ListingScheduler {
    cycle: PollCycle,
    interval: Duration,
    stats: SchedulerStats,
}

impl ListingScheduler {
    pub fn new(cycle: PollCycle, interval: Duration) -> Self {
        Self {
            cycle,
            interval,
            stats: SchedulerStats::default(),
        }
    }

    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    pub fn cycle(&self) -> &PollCycle {
        &self.cycle
    }

    /// Run one sweep and fold its report into the running stats.
    pub async fn tick(&mut self) -> CycleReport {
        let started = Instant::now();
        let report = self.cycle.run().await;
        self.stats.record(&report);

        tracing::info!(
            cycle = self.stats.cycles_run,
            sources = report.sources_polled,
            failed_sources = report.sources_failed,
            new = report.new_listings,
            sent = report.notifications_sent,
            seen = self.cycle.seen().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Poll cycle complete"
        );
        report
    }

    /// Loops until the process is terminated. Returns immediately when there
    /// is nothing to poll.
    pub async fn run(&mut self) {
        if self.cycle.urls().is_empty() {
            tracing::warn!("No URLs to monitor, scheduler not started");
            return;
        }

        tracing::info!(
            urls = self.cycle.urls().len(),
            interval_secs = self.interval.as_secs(),
            "Listing scheduler started"
        );

        loop {
            self.tick().await;
            tokio::time::sleep(self.interval).await;
        }
    }

    /// Like [`run`](Self::run), but stops as soon as `shutdown` completes.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let stopped = tokio::select! {
            _ = self.run() => false,
            _ = shutdown => true,
        };

        if stopped {
            tracing::info!(cycles = self.stats.cycles_run, "Listing scheduler stopping");
        }
    }
}
