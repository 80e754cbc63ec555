// src/sentiment.rs
//! Sentiment scoring seam. The pipeline treats the scorer as a black box
//! producing a polarity in [-1.0, 1.0]; the default implementation is a
//! lexicon scorer with a short negation window.

use std::collections::HashMap;

use anyhow::Result;
use once_cell::sync::Lazy;

static LEXICON: Lazy<HashMap<String, i32>> = Lazy::new(|| {
    let raw = include_str!("../sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, i32>>(raw).expect("valid sentiment lexicon")
});

/// Lexicon weights live in [-MAX_WORD_WEIGHT, MAX_WORD_WEIGHT]; the polarity
/// normalization divides by this bound.
const MAX_WORD_WEIGHT: i32 = 3;

/// Pure text → polarity function. Deterministic for a given scorer version.
pub trait SentimentScorer: Send + Sync {
    /// Polarity in [-1.0, 1.0]. An `Err` drops the item from the batch;
    /// it never aborts the cycle.
    fn score(&self, text: &str) -> Result<f64>;
}

/// Default scorer: embedded word lexicon, negation inversion, polarity
/// normalized by the number of matched words.
#[derive(Debug, Clone, Default)]
pub struct LexiconScorer;

impl LexiconScorer {
    pub fn new() -> Self {
        Self
    }

    #[inline]
    fn word_score(&self, w: &str) -> i32 {
        *LEXICON.get(w).unwrap_or(&0)
    }

    /// Returns (lexicon sum, matched word count).
    /// Negation: a negator within the previous 1..=3 tokens inverts the sign
    /// of the matched word's score.
    fn raw_score(&self, text: &str) -> (i32, usize) {
        let tokens: Vec<String> = tokenize(text).collect();
        let mut sum: i32 = 0;
        let mut hits: usize = 0;

        for i in 0..tokens.len() {
            let base = self.word_score(tokens[i].as_str());
            if base == 0 {
                continue;
            }
            let negated = (1..=3).any(|k| i >= k && is_negator(tokens[i - k].as_str()));
            sum += if negated { -base } else { base };
            hits += 1;
        }

        (sum, hits)
    }
}

impl SentimentScorer for LexiconScorer {
    fn score(&self, text: &str) -> Result<f64> {
        // Non-text input scores exactly 0.0 without touching the lexicon.
        if text.trim().is_empty() {
            return Ok(0.0);
        }
        let (sum, hits) = self.raw_score(text);
        if hits == 0 {
            return Ok(0.0);
        }
        let polarity = f64::from(sum) / (f64::from(MAX_WORD_WEIGHT) * hits as f64);
        Ok(polarity.clamp(-1.0, 1.0))
    }
}

/// Alphanumeric tokens, lower-cased.
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_ascii_lowercase())
}

/// Single-token negators; "no longer" is covered by "no" after tokenization.
fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not"
            | "no"
            | "never"
            | "isn't"
            | "wasn't"
            | "aren't"
            | "won't"
            | "can't"
            | "cannot"
            | "without"
    )
}
