// tests/engine_e2e.rs
//
// Full refresh cycles against scripted sources and scorers: the
// fetch → classify → merge → aggregate path, interval gating, busy
// rejection, source outage and timeout degradation, and the
// storage-failure rollback.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Notify;

use topic_sentiment_monitor::aggregate::Band;
use topic_sentiment_monitor::config::MonitorConfig;
use topic_sentiment_monitor::engine::{Monitor, RefreshStatus};
use topic_sentiment_monitor::ingest::types::ItemSource;
use topic_sentiment_monitor::record::{Category, RawItem, Signal};
use topic_sentiment_monitor::sentiment::SentimentScorer;
use topic_sentiment_monitor::storage::{MemoryStorage, RecordStorage};

fn test_config() -> MonitorConfig {
    MonitorConfig {
        keyword: "china".into(),
        refresh_interval_secs: 300,
        sentiment_threshold: 0.1,
        fetch_limit: 10,
        fetch_timeout_secs: 5,
        ..MonitorConfig::default()
    }
}

/// Returns the same batch on every fetch, like a feed that has not moved.
struct ScriptedSource {
    items: Vec<RawItem>,
}

#[async_trait]
impl ItemSource for ScriptedSource {
    async fn fetch(&self, _keyword: &str, _limit: usize) -> Result<Vec<RawItem>> {
        Ok(self.items.clone())
    }
    fn name(&self) -> &'static str {
        "Scripted"
    }
}

struct FailingSource;

#[async_trait]
impl ItemSource for FailingSource {
    async fn fetch(&self, _keyword: &str, _limit: usize) -> Result<Vec<RawItem>> {
        anyhow::bail!("feed offline")
    }
    fn name(&self) -> &'static str {
        "Failing"
    }
}

struct NeverReturnsSource;

#[async_trait]
impl ItemSource for NeverReturnsSource {
    async fn fetch(&self, _keyword: &str, _limit: usize) -> Result<Vec<RawItem>> {
        std::future::pending().await
    }
    fn name(&self) -> &'static str {
        "NeverReturns"
    }
}

/// Blocks inside fetch until released, to hold a cycle in flight.
struct GatedSource {
    started: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl ItemSource for GatedSource {
    async fn fetch(&self, _keyword: &str, _limit: usize) -> Result<Vec<RawItem>> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(Vec::new())
    }
    fn name(&self) -> &'static str {
        "Gated"
    }
}

/// Known phrases score like the black-box model would; everything else is 0.
struct TableScorer;

impl SentimentScorer for TableScorer {
    fn score(&self, text: &str) -> Result<f64> {
        if text.contains("great") {
            Ok(0.6)
        } else if text.contains("weak") {
            Ok(-0.4)
        } else {
            Ok(0.0)
        }
    }
}

fn two_item_source() -> Arc<ScriptedSource> {
    Arc::new(ScriptedSource {
        items: vec![
            RawItem {
                id: "1".into(),
                text: "China trade deal great!".into(),
                published_at: 2_000,
            },
            RawItem {
                id: "2".into(),
                text: "China economy weak".into(),
                published_at: 1_000,
            },
        ],
    })
}

#[tokio::test]
async fn end_to_end_two_item_cycle() {
    let monitor = Monitor::new(
        test_config(),
        two_item_source(),
        Arc::new(TableScorer),
        Arc::new(MemoryStorage::new()),
    )
    .unwrap();

    let outcome = monitor.request_refresh(true).await.unwrap();
    assert_eq!(outcome.status, RefreshStatus::Refreshed);
    assert_eq!(outcome.fetched_count, 2);
    assert_eq!(outcome.merged_count, 2);
    assert_eq!(outcome.dropped_count, 0);
    assert!(outcome.error.is_none());

    let snap = monitor.snapshot();
    assert_eq!(snap.len(), 2);

    // Newest first: id=1 (observed 2000) before id=2 (observed 1000).
    assert_eq!(snap[0].id, "1");
    assert_eq!(snap[0].category, Category::Positive);
    assert_eq!(snap[0].signal, Signal::Long);
    assert_eq!(snap[1].id, "2");
    assert_eq!(snap[1].category, Category::Negative);
    assert_eq!(snap[1].signal, Signal::Short);

    // Mean of 0.6 and -0.4 sits at the 0.1 threshold: Watch, not Bullish.
    let agg = monitor.aggregate().expect("two records aggregated");
    assert!((agg.mean_score - 0.1).abs() < 1e-9, "mean {}", agg.mean_score);
    assert_eq!(agg.band, Band::Watch);
    assert_eq!(agg.sample_count, 2);
}

#[tokio::test]
async fn refetching_the_same_feed_does_not_duplicate() {
    let monitor = Monitor::new(
        test_config(),
        two_item_source(),
        Arc::new(TableScorer),
        Arc::new(MemoryStorage::new()),
    )
    .unwrap();

    monitor.request_refresh(true).await.unwrap();
    let outcome = monitor.request_refresh(true).await.unwrap();

    // Same ids merge as replacements, never as appended duplicates.
    assert_eq!(outcome.merged_count, 2);
    assert_eq!(monitor.snapshot().len(), 2);
}

#[tokio::test]
async fn unforced_refresh_within_interval_serves_from_cache() {
    let monitor = Monitor::new(
        test_config(),
        two_item_source(),
        Arc::new(TableScorer),
        Arc::new(MemoryStorage::new()),
    )
    .unwrap();

    // First unforced call: never refreshed, so the fetch runs.
    let first = monitor.request_refresh(false).await.unwrap();
    assert_eq!(first.status, RefreshStatus::Refreshed);

    // Immediately after: interval has not elapsed, no fetch, store untouched.
    let second = monitor.request_refresh(false).await.unwrap();
    assert_eq!(second.status, RefreshStatus::NotDue);
    assert_eq!(second.fetched_count, 0);
    assert_eq!(second.merged_count, 0);
    assert_eq!(monitor.snapshot().len(), 2);
}

#[tokio::test]
async fn source_outage_degrades_to_zero_item_cycle() {
    let monitor = Monitor::new(
        test_config(),
        Arc::new(FailingSource),
        Arc::new(TableScorer),
        Arc::new(MemoryStorage::new()),
    )
    .unwrap();

    let outcome = monitor.request_refresh(true).await.unwrap();
    assert_eq!(outcome.status, RefreshStatus::Refreshed);
    assert_eq!(outcome.fetched_count, 0);
    assert_eq!(outcome.merged_count, 0);
    let err = outcome.error.expect("outage surfaced as warning");
    assert!(err.contains("source unavailable"), "got: {err}");
    assert!(monitor.snapshot().is_empty());

    // The clock restarted anyway; the outage gets one attempt per interval.
    let state = monitor.refresh_state().await;
    assert!(state.last_refresh_at.is_some());
    let gated = monitor.request_refresh(false).await.unwrap();
    assert_eq!(gated.status, RefreshStatus::NotDue);
}

#[tokio::test(start_paused = true)]
async fn hung_source_times_out_instead_of_blocking() {
    let config = MonitorConfig {
        fetch_timeout_secs: 1,
        ..test_config()
    };
    let monitor = Monitor::new(
        config,
        Arc::new(NeverReturnsSource),
        Arc::new(TableScorer),
        Arc::new(MemoryStorage::new()),
    )
    .unwrap();

    let outcome = monitor.request_refresh(true).await.unwrap();
    assert_eq!(outcome.status, RefreshStatus::Refreshed);
    assert_eq!(outcome.fetched_count, 0);
    let err = outcome.error.expect("timeout surfaced as warning");
    assert!(err.contains("timed out"), "got: {err}");
}

#[tokio::test]
async fn refresh_while_cycle_in_flight_is_rejected_busy() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let monitor = Arc::new(
        Monitor::new(
            test_config(),
            Arc::new(GatedSource {
                started: started.clone(),
                release: release.clone(),
            }),
            Arc::new(TableScorer),
            Arc::new(MemoryStorage::new()),
        )
        .unwrap(),
    );

    let in_flight = {
        let monitor = monitor.clone();
        tokio::spawn(async move { monitor.request_refresh(true).await })
    };

    // Wait until the first cycle is inside its fetch, then ask again.
    started.notified().await;
    let busy = monitor.request_refresh(true).await.unwrap();
    assert_eq!(busy.status, RefreshStatus::Busy);
    assert_eq!(busy.merged_count, 0);

    release.notify_one();
    let first = in_flight.await.unwrap().unwrap();
    assert_eq!(first.status, RefreshStatus::Refreshed);
}

/// Fails every save, for the fatal-persist path.
struct BrokenStorage;

impl RecordStorage for BrokenStorage {
    fn load_all(&self) -> Result<Vec<topic_sentiment_monitor::record::ClassifiedRecord>> {
        Ok(Vec::new())
    }
    fn save_all(
        &self,
        _records: &[topic_sentiment_monitor::record::ClassifiedRecord],
    ) -> Result<()> {
        anyhow::bail!("disk full")
    }
}

#[tokio::test]
async fn storage_failure_is_fatal_for_the_cycle_and_rolls_back() {
    let monitor = Monitor::new(
        test_config(),
        two_item_source(),
        Arc::new(TableScorer),
        Arc::new(BrokenStorage),
    )
    .unwrap();

    let err = monitor.request_refresh(true).await.unwrap_err();
    assert!(err.to_string().contains("disk full"));
    assert!(monitor.snapshot().is_empty(), "memory must match durable state");
}
