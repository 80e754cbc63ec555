// src/scheduler.rs
//! Refresh gating, decoupled from any blocking wait primitive: callers ask
//! `is_due` with their own clock and mark the state after a triggered fetch,
//! so the decision is testable without a timer.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RefreshState {
    /// Unix seconds of the last triggered fetch. `None` means never
    /// refreshed, which counts as infinitely overdue.
    pub last_refresh_at: Option<u64>,
    pub interval_secs: u64,
}

impl RefreshState {
    pub fn new(interval_secs: u64) -> Self {
        Self {
            last_refresh_at: None,
            interval_secs,
        }
    }

    /// Due iff strictly more than `interval_secs` have elapsed. Elapsed time
    /// exactly equal to the interval is not yet due.
    pub fn is_due(&self, now: u64) -> bool {
        match self.last_refresh_at {
            None => true,
            Some(last) => now.saturating_sub(last) > self.interval_secs,
        }
    }

    /// Restart the interval clock, whether or not the fetch produced items.
    /// A failing source gets exactly one attempt per interval.
    pub fn mark_refreshed(&mut self, now: u64) {
        self.last_refresh_at = Some(now);
    }
}
