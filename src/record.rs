// src/record.rs
//! Core pipeline types: raw feed items, classified records, and the
//! polarity → category → signal mappings.

use serde::{Deserialize, Serialize};

/// Raw candidate item as produced by an `ItemSource`.
/// Transient: exists only within one refresh cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    /// Stable across refreshes; dedup key downstream.
    pub id: String,
    pub text: String,
    /// Original publication time, unix seconds.
    pub published_at: u64,
}

/// 3-way sentiment category derived from a polarity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Positive,
    Negative,
    Neutral,
}

/// Recommendation token, mapped one-to-one from `Category`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Long,
    Short,
    Hold,
}

impl Category {
    /// Open-interval classification: a score exactly at the threshold is
    /// Neutral, not Positive/Negative.
    pub fn from_score(score: f64, threshold: f64) -> Self {
        if score > threshold {
            Category::Positive
        } else if score < -threshold {
            Category::Negative
        } else {
            Category::Neutral
        }
    }

    /// Exhaustive over all categories; adding a category must extend this.
    pub fn signal(self) -> Signal {
        match self {
            Category::Positive => Signal::Long,
            Category::Negative => Signal::Short,
            Category::Neutral => Signal::Hold,
        }
    }
}

/// Durable, classified form of a `RawItem`. Owned by the store once created;
/// replaced wholesale when the same id is merged again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedRecord {
    pub id: String,
    pub text: String,
    /// Original publication time, unix seconds. Sort key for presentation.
    pub observed_at: u64,
    /// When the record went through the pipeline, unix seconds.
    pub fetched_at: u64,
    /// Polarity in [-1.0, 1.0].
    pub score: f64,
    pub category: Category,
    pub signal: Signal,
}
