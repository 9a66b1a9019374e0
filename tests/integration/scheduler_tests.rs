use std::sync::Arc;
use std::time::Duration;

use listing_watcher::{DedupStore, ListingScheduler, PollCycle, SeenSet};
use tempfile::TempDir;

use super::*;

const INTERVAL: Duration = Duration::from_secs(60);

fn scheduler_for(
    dir: &TempDir,
    source: &Arc<FakeSource>,
    notifier: &Arc<FakeNotifier>,
    urls: &[&str],
) -> ListingScheduler {
    let cycle = PollCycle::new(
        source.clone(),
        notifier.clone(),
        DedupStore::new(dir.path().join("sent_urls.json")),
        SeenSet::new(),
        urls.iter().map(|u| u.to_string()).collect(),
        CHAT,
    );
    ListingScheduler::new(cycle, INTERVAL)
}

#[tokio::test(start_paused = true)]
async fn test_sweeps_once_per_interval() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(FakeSource::new());
    let notifier = Arc::new(FakeNotifier::new());
    source.serve(URL_A, listings(&["a"]));
    let mut scheduler = scheduler_for(&dir, &source, &notifier, &[URL_A]);

    // Sweeps at t = 0s, 60s and 120s.
    let result = tokio::time::timeout(Duration::from_secs(150), scheduler.run()).await;

    assert!(result.is_err(), "run() should never return on its own");
    assert_eq!(source.fetch_count(URL_A), 3);
    assert_eq!(scheduler.stats().cycles_run, 3);
    assert_eq!(scheduler.stats().notifications_sent, 1);
}

#[tokio::test(start_paused = true)]
async fn test_listings_appearing_later_are_notified_once() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(FakeSource::new());
    let notifier = Arc::new(FakeNotifier::new());
    source
        .serve(URL_A, listings(&["a"]))
        .serve(URL_A, listings(&["b", "a"]))
        .serve(URL_A, listings(&["c", "b", "a"]));
    let mut scheduler = scheduler_for(&dir, &source, &notifier, &[URL_A]);

    let _ = tokio::time::timeout(Duration::from_secs(300), scheduler.run()).await;

    assert_eq!(notifier.delivered_links(), vec!["a", "b", "c"]);
    assert_eq!(scheduler.cycle().seen().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_errors_do_not_stop_the_loop() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(FakeSource::new());
    let notifier = Arc::new(FakeNotifier::new());
    source.fail(URL_A);
    source.serve(URL_B, listings(&["b"]));
    notifier.block("b");
    let mut scheduler = scheduler_for(&dir, &source, &notifier, &[URL_A, URL_B]);

    let _ = tokio::time::timeout(Duration::from_secs(250), scheduler.run()).await;

    let stats = scheduler.stats();
    assert_eq!(stats.cycles_run, 5);
    assert_eq!(stats.failed_fetches, 5);
    assert_eq!(stats.failed_deliveries, 5);
    assert_eq!(notifier.attempts(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_empty_source_list_never_starts() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(FakeSource::new());
    let notifier = Arc::new(FakeNotifier::new());
    let mut scheduler = scheduler_for(&dir, &source, &notifier, &[]);

    let result = tokio::time::timeout(Duration::from_secs(1), scheduler.run()).await;

    assert!(result.is_ok());
    assert_eq!(scheduler.stats().cycles_run, 0);
    assert!(source.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_run_until_stops_on_shutdown() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(FakeSource::new());
    let notifier = Arc::new(FakeNotifier::new());
    source.serve(URL_A, Vec::new());
    let mut scheduler = scheduler_for(&dir, &source, &notifier, &[URL_A]);

    scheduler
        .run_until(tokio::time::sleep(Duration::from_secs(90)))
        .await;

    assert_eq!(scheduler.stats().cycles_run, 2);
}

#[tokio::test]
async fn test_tick_runs_a_single_sweep() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(FakeSource::new());
    let notifier = Arc::new(FakeNotifier::new());
    source.serve(URL_A, listings(&["a", "b"]));
    let mut scheduler = scheduler_for(&dir, &source, &notifier, &[URL_A]);

    let report = scheduler.tick().await;

    assert_eq!(report.notifications_sent, 2);
    assert_eq!(scheduler.stats().cycles_run, 1);
    assert_eq!(source.fetch_count(URL_A), 1);
}
