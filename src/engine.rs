// src/engine.rs
//! # Refresh Cycle Engine
//! Orchestrates one gated refresh cycle: due-check → fetch → classify →
//! merge. One cycle runs at a time; a request arriving while a cycle is in
//! flight is rejected as busy rather than queued, and the periodic loop
//! simply retries on its next tick.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::aggregate::{self, AggregateResult};
use crate::config::MonitorConfig;
use crate::ingest::{self, types::ItemSource};
use crate::record::{ClassifiedRecord, RawItem};
use crate::scheduler::RefreshState;
use crate::sentiment::SentimentScorer;
use crate::storage::RecordStorage;
use crate::store::RecordStore;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "monitor_refresh_cycles_total",
            "Refresh cycles that performed a fetch."
        );
        describe_counter!(
            "monitor_refresh_busy_total",
            "Refresh requests rejected because a cycle was in flight."
        );
        describe_counter!(
            "monitor_source_errors_total",
            "Fetch attempts that failed or timed out."
        );
        describe_gauge!("monitor_last_refresh_ts", "Unix ts of the last triggered fetch.");
        describe_gauge!("monitor_store_records", "Records currently in the store.");
    });
}

/// How a refresh request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshStatus {
    /// A fetch ran (forced or due) and its results were merged.
    Refreshed,
    /// The interval had not elapsed; the cached store is current.
    NotDue,
    /// Another cycle was in flight; nothing ran.
    Busy,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshOutcome {
    pub status: RefreshStatus,
    pub fetched_count: usize,
    pub merged_count: usize,
    /// Items dropped as malformed or on scorer failure.
    pub dropped_count: usize,
    /// Non-fatal fetch problem; the cycle still committed with zero items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RefreshOutcome {
    fn skipped(status: RefreshStatus) -> Self {
        Self {
            status,
            fetched_count: 0,
            merged_count: 0,
            dropped_count: 0,
            error: None,
        }
    }
}

pub struct Monitor {
    config: MonitorConfig,
    store: RecordStore,
    source: Arc<dyn ItemSource>,
    scorer: Arc<dyn SentimentScorer>,
    /// Holds the scheduler state and doubles as the single-cycle guard:
    /// whoever owns the lock owns the cycle.
    refresh: Mutex<RefreshState>,
}

impl Monitor {
    pub fn new(
        config: MonitorConfig,
        source: Arc<dyn ItemSource>,
        scorer: Arc<dyn SentimentScorer>,
        storage: Arc<dyn RecordStorage>,
    ) -> Result<Self> {
        ensure_metrics_described();
        let store = RecordStore::open(storage)?;
        let refresh = Mutex::new(RefreshState::new(config.refresh_interval_secs));
        Ok(Self {
            config,
            store,
            source,
            scorer,
            refresh,
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Current scheduler state, for the debug surface.
    pub async fn refresh_state(&self) -> RefreshState {
        *self.refresh.lock().await
    }

    /// Ordered view of the merged records, newest first.
    pub fn snapshot(&self) -> Vec<ClassifiedRecord> {
        self.store.snapshot()
    }

    /// Recomputed from the full snapshot on every call; no cached aggregate.
    pub fn aggregate(&self) -> Option<AggregateResult> {
        aggregate::summarize(&self.store.snapshot(), self.config.sentiment_threshold)
    }

    /// Run one gated refresh cycle. `force` bypasses the interval check.
    ///
    /// Only a storage write failure is an `Err`; source trouble degrades to
    /// a zero-item cycle with `outcome.error` set.
    pub async fn request_refresh(&self, force: bool) -> Result<RefreshOutcome> {
        let mut state = match self.refresh.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                counter!("monitor_refresh_busy_total").increment(1);
                return Ok(RefreshOutcome::skipped(RefreshStatus::Busy));
            }
        };

        let now = now_unix();
        if !force && !state.is_due(now) {
            return Ok(RefreshOutcome::skipped(RefreshStatus::NotDue));
        }

        let (raw, fetch_error) = self.fetch_bounded().await;
        // The clock restarts whether or not the fetch produced anything, so
        // a failing source gets one attempt per interval.
        state.mark_refreshed(now);
        counter!("monitor_refresh_cycles_total").increment(1);
        gauge!("monitor_last_refresh_ts").set(now as f64);

        let fetched_count = raw.len();
        let (records, filtered_out, dropped) = ingest::process_batch(
            raw,
            &self.config.keyword,
            self.config.sentiment_threshold,
            self.scorer.as_ref(),
            now,
        );

        let merged_count = self.store.merge(records)?;
        gauge!("monitor_store_records").set(self.store.len() as f64);

        tracing::info!(
            target: "monitor",
            fetched = fetched_count,
            filtered = filtered_out,
            dropped,
            merged = merged_count,
            "refresh cycle"
        );

        Ok(RefreshOutcome {
            status: RefreshStatus::Refreshed,
            fetched_count,
            merged_count,
            dropped_count: dropped,
            error: fetch_error,
        })
    }

    /// Fetch with a hard timeout; any failure means an empty batch this
    /// cycle, surfaced as a warning rather than an error.
    async fn fetch_bounded(&self) -> (Vec<RawItem>, Option<String>) {
        let timeout = Duration::from_secs(self.config.fetch_timeout_secs);
        let fetch = self.source.fetch(&self.config.keyword, self.config.fetch_limit);

        match tokio::time::timeout(timeout, fetch).await {
            Ok(Ok(items)) => (items, None),
            Ok(Err(e)) => {
                tracing::warn!(
                    target: "monitor",
                    error = ?e,
                    source = self.source.name(),
                    "source fetch failed"
                );
                counter!("monitor_source_errors_total").increment(1);
                (Vec::new(), Some(format!("source unavailable: {e:#}")))
            }
            Err(_) => {
                tracing::warn!(
                    target: "monitor",
                    source = self.source.name(),
                    timeout_secs = self.config.fetch_timeout_secs,
                    "source fetch timed out"
                );
                counter!("monitor_source_errors_total").increment(1);
                (
                    Vec::new(),
                    Some("source unavailable: fetch timed out".to_string()),
                )
            }
        }
    }
}

/// Periodic driver for the scheduler: each tick asks for a non-forced
/// refresh. Gating and busy rejection live inside `request_refresh`, so the
/// loop itself carries no state.
pub fn spawn_refresh_loop(monitor: Arc<Monitor>) -> JoinHandle<()> {
    let period = Duration::from_secs(monitor.config().refresh_interval_secs.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            match monitor.request_refresh(false).await {
                Ok(outcome) => tracing::debug!(
                    target: "monitor",
                    status = ?outcome.status,
                    merged = outcome.merged_count,
                    "scheduled refresh tick"
                ),
                Err(e) => tracing::error!(
                    target: "monitor",
                    error = ?e,
                    "scheduled refresh failed to persist"
                ),
            }
        }
    })
}

fn now_unix() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}
