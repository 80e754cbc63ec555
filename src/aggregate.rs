// src/aggregate.rs
//! Aggregate recommendation signal over the visible record set.

use serde::{Deserialize, Serialize};

use crate::record::ClassifiedRecord;

/// Recommendation band over the mean sentiment of the visible window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Bullish,
    Bearish,
    Watch,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub mean_score: f64,
    pub band: Band,
    pub sample_count: usize,
}

/// Arithmetic mean of `score` over `records`, banded by the same
/// open-interval threshold the per-item classifier uses (a mean exactly at
/// the threshold is Watch). `None` for empty input: an empty window is
/// "no data", not a neutral one.
pub fn summarize(records: &[ClassifiedRecord], threshold: f64) -> Option<AggregateResult> {
    if records.is_empty() {
        return None;
    }

    let sum: f64 = records.iter().map(|r| r.score).sum();
    let mean = sum / records.len() as f64;

    let band = if mean > threshold {
        Band::Bullish
    } else if mean < -threshold {
        Band::Bearish
    } else {
        Band::Watch
    };

    Some(AggregateResult {
        mean_score: mean,
        band,
        sample_count: records.len(),
    })
}
