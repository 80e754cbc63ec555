// src/storage.rs
//! Durable record persistence: whole-collection load/save. Volumes are small
//! (hundreds of records), so a full rewrite per merge is acceptable.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};

use crate::record::ClassifiedRecord;

pub trait RecordStorage: Send + Sync {
    fn load_all(&self) -> Result<Vec<ClassifiedRecord>>;
    fn save_all(&self, records: &[ClassifiedRecord]) -> Result<()>;
}

/// JSON file storage. Writes go to `<path>.tmp`, are fsynced, then renamed
/// over the target, so a crash mid-write leaves the previous file intact and
/// a crash after a successful save loses nothing.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut p = self.path.clone().into_os_string();
        p.push(".tmp");
        PathBuf::from(p)
    }
}

impl RecordStorage for JsonFileStorage {
    fn load_all(&self) -> Result<Vec<ClassifiedRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("reading records from {}", self.path.display()))?;
        let records: Vec<ClassifiedRecord> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing records from {}", self.path.display()))?;
        Ok(records)
    }

    fn save_all(&self, records: &[ClassifiedRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }

        let tmp = self.tmp_path();
        let body = serde_json::to_vec_pretty(records).context("serializing records")?;

        let mut f = fs::File::create(&tmp)
            .with_context(|| format!("creating {}", tmp.display()))?;
        f.write_all(&body)
            .with_context(|| format!("writing {}", tmp.display()))?;
        f.sync_all()
            .with_context(|| format!("syncing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

/// In-memory storage for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryStorage {
    inner: Mutex<Vec<ClassifiedRecord>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStorage for MemoryStorage {
    fn load_all(&self) -> Result<Vec<ClassifiedRecord>> {
        Ok(self.inner.lock().expect("memory storage mutex poisoned").clone())
    }

    fn save_all(&self, records: &[ClassifiedRecord]) -> Result<()> {
        *self.inner.lock().expect("memory storage mutex poisoned") = records.to_vec();
        Ok(())
    }
}
