// src/ingest/types.rs
use anyhow::Result;

use crate::record::RawItem;

/// Source of raw candidate items. May return fewer than `limit`, may return
/// an empty batch, and is not expected to deduplicate or filter; the
/// pipeline handles both.
#[async_trait::async_trait]
pub trait ItemSource: Send + Sync {
    async fn fetch(&self, keyword: &str, limit: usize) -> Result<Vec<RawItem>>;
    fn name(&self) -> &'static str;
}
