// tests/storage_durability.rs
//
// JSON file storage: round trip, missing-file bootstrap, atomic rewrite
// (no .tmp remnants, previous content intact until the rename).

use topic_sentiment_monitor::record::{Category, ClassifiedRecord};
use topic_sentiment_monitor::storage::{JsonFileStorage, RecordStorage};

fn rec(id: &str, observed_at: u64, score: f64) -> ClassifiedRecord {
    ClassifiedRecord {
        id: id.into(),
        text: format!("china item {id}"),
        observed_at,
        fetched_at: observed_at + 5,
        score,
        category: Category::from_score(score, 0.1),
        signal: Category::from_score(score, 0.1).signal(),
    }
}

#[test]
fn missing_file_loads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let storage = JsonFileStorage::new(dir.path().join("records.json"));
    assert!(storage.load_all().unwrap().is_empty());
}

#[test]
fn save_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let storage = JsonFileStorage::new(dir.path().join("records.json"));

    let records = vec![rec("1", 100, 0.6), rec("2", 200, -0.4)];
    storage.save_all(&records).unwrap();

    let loaded = storage.load_all().unwrap();
    assert_eq!(loaded, records);
}

#[test]
fn save_creates_missing_parent_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let storage = JsonFileStorage::new(dir.path().join("nested/deeper/records.json"));

    storage.save_all(&[rec("1", 100, 0.0)]).unwrap();
    assert_eq!(storage.load_all().unwrap().len(), 1);
}

#[test]
fn rewrite_replaces_whole_collection_and_leaves_no_tmp() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.json");
    let storage = JsonFileStorage::new(path.clone());

    storage.save_all(&[rec("1", 100, 0.6)]).unwrap();
    storage
        .save_all(&[rec("2", 200, -0.4), rec("3", 300, 0.1)])
        .unwrap();

    let loaded = storage.load_all().unwrap();
    assert_eq!(loaded.len(), 2);
    assert!(loaded.iter().all(|r| r.id != "1"));

    // The tmp file is renamed over the target, never left behind.
    let tmp = dir.path().join("records.json.tmp");
    assert!(!tmp.exists());
    assert!(path.exists());
}

#[test]
fn corrupt_file_is_a_load_error_not_a_silent_reset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.json");
    std::fs::write(&path, "{ not json").unwrap();

    let storage = JsonFileStorage::new(path);
    assert!(storage.load_all().is_err());
}
