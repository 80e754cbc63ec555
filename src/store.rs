// src/store.rs
//! Dedup merge store: the durable record of every classified item seen so
//! far, unique by id, kept sorted newest-first for presentation.

use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::record::ClassifiedRecord;
use crate::storage::RecordStorage;

pub struct RecordStore {
    inner: Mutex<Vec<ClassifiedRecord>>,
    storage: Arc<dyn RecordStorage>,
}

impl RecordStore {
    /// Open the store, loading any previously persisted records.
    pub fn open(storage: Arc<dyn RecordStorage>) -> Result<Self> {
        let mut records = storage.load_all()?;
        sort_records(&mut records);
        Ok(Self {
            inner: Mutex::new(records),
            storage,
        })
    }

    /// Merge a classified batch: insert new ids, replace existing ones
    /// wholesale (last-write-wins, no partial-field merge). Within a batch
    /// the later occurrence of a repeated id wins.
    ///
    /// The merged set is persisted before this returns; when the write
    /// fails, the in-memory state is restored to the pre-merge snapshot and
    /// the error propagates, so memory and disk never diverge.
    pub fn merge(&self, batch: Vec<ClassifiedRecord>) -> Result<usize> {
        if batch.is_empty() {
            return Ok(0);
        }

        let mut guard = self.inner.lock().expect("record store mutex poisoned");
        let previous = guard.clone();

        let mut merged = 0usize;
        for rec in batch {
            match guard.iter_mut().find(|r| r.id == rec.id) {
                Some(slot) => *slot = rec,
                None => guard.push(rec),
            }
            merged += 1;
        }
        sort_records(&mut guard);

        if let Err(e) = self.storage.save_all(&guard) {
            *guard = previous;
            return Err(e);
        }
        Ok(merged)
    }

    /// Cloned, ordered view; mutating it cannot affect stored state.
    pub fn snapshot(&self) -> Vec<ClassifiedRecord> {
        self.inner.lock().expect("record store mutex poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("record store mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Newest first; id tiebreak so equal timestamps order deterministically.
fn sort_records(records: &mut [ClassifiedRecord]) {
    records.sort_by(|a, b| {
        b.observed_at
            .cmp(&a.observed_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
