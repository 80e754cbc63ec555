// src/ingest/mod.rs
pub mod providers;
pub mod types;

use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

use crate::record::{Category, ClassifiedRecord, RawItem};
use crate::sentiment::SentimentScorer;

/// One-time metrics registration (so series show up for any wired exporter).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("monitor_items_total", "Raw items entering the pipeline.");
        describe_counter!(
            "monitor_items_kept_total",
            "Items classified and handed to the store."
        );
        describe_counter!(
            "monitor_items_filtered_total",
            "Items without the topic keyword."
        );
        describe_counter!(
            "monitor_items_dropped_total",
            "Items dropped as malformed or on scorer failure."
        );
        describe_histogram!("monitor_feed_parse_ms", "Provider parse time in milliseconds.");
    });
}

/// Normalize item text: decode HTML entities, strip tags, collapse
/// whitespace, cap length.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // Length cap: 2000 chars
    if out.chars().count() > 2000 {
        out = out.chars().take(2000).collect();
    }

    out
}

/// Case-insensitive substring match of the topic keyword. No tokenization,
/// no synonyms; the keyword inside an unrelated word still matches.
pub fn keyword_matches(text: &str, keyword: &str) -> bool {
    text.to_lowercase().contains(&keyword.to_lowercase())
}

/// Short stable id for log lines; raw item text never hits the logs.
fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Filter & classify one raw batch. Pure transform over the inputs; the
/// store is not touched here.
///
/// Per item: shape validation → keyword filter → scoring → category →
/// signal. Returns `(kept, filtered_out, dropped)` where `filtered_out`
/// counts keyword misses and `dropped` counts malformed items and scorer
/// failures. Both are expected and non-fatal.
pub fn process_batch(
    items: Vec<RawItem>,
    keyword: &str,
    threshold: f64,
    scorer: &dyn SentimentScorer,
    fetched_at: u64,
) -> (Vec<ClassifiedRecord>, usize, usize) {
    ensure_metrics_described();
    counter!("monitor_items_total").increment(items.len() as u64);

    let mut kept = Vec::with_capacity(items.len());
    let mut filtered_out = 0usize;
    let mut dropped = 0usize;

    for item in items {
        let text = normalize_text(&item.text);
        if item.id.trim().is_empty() || text.is_empty() || item.published_at == 0 {
            dropped += 1;
            continue;
        }
        if !keyword_matches(&text, keyword) {
            filtered_out += 1;
            continue;
        }

        let score = match scorer.score(&text) {
            Ok(s) => s.clamp(-1.0, 1.0),
            Err(e) => {
                tracing::warn!(
                    target: "monitor",
                    error = ?e,
                    item = %anon_hash(&text),
                    "scorer failed; dropping item"
                );
                dropped += 1;
                continue;
            }
        };

        let category = Category::from_score(score, threshold);
        kept.push(ClassifiedRecord {
            id: item.id,
            text,
            observed_at: item.published_at,
            fetched_at,
            score,
            category,
            signal: category.signal(),
        });
    }

    counter!("monitor_items_kept_total").increment(kept.len() as u64);
    counter!("monitor_items_filtered_total").increment(filtered_out as u64);
    counter!("monitor_items_dropped_total").increment(dropped as u64);

    (kept, filtered_out, dropped)
}
