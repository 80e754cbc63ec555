// tests/aggregate.rs
//
// Aggregate signal: mean computation, band mapping (open intervals on the
// mean too), and the explicit no-data result for an empty window.

use topic_sentiment_monitor::aggregate::{summarize, Band};
use topic_sentiment_monitor::record::{Category, ClassifiedRecord};

fn rec(id: &str, score: f64) -> ClassifiedRecord {
    let category = Category::from_score(score, 0.1);
    ClassifiedRecord {
        id: id.into(),
        text: format!("china item {id}"),
        observed_at: 1_000,
        fetched_at: 1_005,
        score,
        category,
        signal: category.signal(),
    }
}

#[test]
fn empty_input_is_no_data_not_zero() {
    assert!(summarize(&[], 0.1).is_none());
}

#[test]
fn opposed_scores_cancel_to_watch() {
    let records = vec![rec("1", 0.5), rec("2", -0.5)];
    let agg = summarize(&records, 0.1).unwrap();
    assert_eq!(agg.mean_score, 0.0);
    assert_eq!(agg.band, Band::Watch);
    assert_eq!(agg.sample_count, 2);
}

#[test]
fn positive_mean_above_threshold_is_bullish() {
    let records = vec![rec("1", 0.8), rec("2", 0.4)];
    let agg = summarize(&records, 0.1).unwrap();
    assert!((agg.mean_score - 0.6).abs() < 1e-12);
    assert_eq!(agg.band, Band::Bullish);
}

#[test]
fn negative_mean_below_threshold_is_bearish() {
    let records = vec![rec("1", -0.9), rec("2", -0.3)];
    let agg = summarize(&records, 0.1).unwrap();
    assert_eq!(agg.band, Band::Bearish);
}

#[test]
fn mean_exactly_at_threshold_is_watch() {
    // 0.3 and -0.1 average to 0.1 with threshold 0.1: open interval, so Watch.
    let records = vec![rec("1", 0.3), rec("2", -0.1)];
    let agg = summarize(&records, 0.1).unwrap();
    assert!((agg.mean_score - 0.1).abs() < 1e-12);
    assert_eq!(agg.band, Band::Watch);
}

#[test]
fn single_record_mean_is_its_score() {
    let agg = summarize(&[rec("1", -0.7)], 0.1).unwrap();
    assert_eq!(agg.mean_score, -0.7);
    assert_eq!(agg.band, Band::Bearish);
    assert_eq!(agg.sample_count, 1);
}
