//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use content_index::config::{Config, CounterUpdateMode};
use content_index::error::{AppError, Result};
use content_index::models::{FileRecord, MediaType, RecordKey};
use content_index::state::{
    create_in_memory_store, CounterBump, GroupBy, GroupStats, InMemoryStore, RecordFilter,
    RecordSort, ReindexPolicy, UpsertOutcome,
};
use content_index::{ContentIndex, FileStore, RawMetadata};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Config with counter batches awaited inline so assertions see them
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.search.counter_update_mode = CounterUpdateMode::Inline;
    config
}

pub fn test_index() -> ContentIndex {
    ContentIndex::new(create_in_memory_store(), &test_config()).unwrap()
}

pub fn index_over(store: Arc<dyn FileStore>) -> ContentIndex {
    ContentIndex::new(store, &test_config()).unwrap()
}

pub fn raw(value: Value) -> RawMetadata {
    serde_json::from_value(value).unwrap()
}

/// A stored record built directly, bypassing the sanitizer
pub fn record(tenant: Option<&str>, id: &str, media_type: MediaType) -> FileRecord {
    record_at(tenant, id, media_type, Utc::now())
}

pub fn record_at(
    tenant: Option<&str>,
    id: &str,
    media_type: MediaType,
    indexed_at: DateTime<Utc>,
) -> FileRecord {
    FileRecord {
        record_id: id.to_string(),
        tenant_id: tenant.map(str::to_string),
        name: format!("file {}", id),
        caption: None,
        media_type,
        size_bytes: 1024,
        keywords: vec!["file".to_string()],
        owner_id: None,
        source_ref: None,
        quality: None,
        access_count: 0,
        download_count: 0,
        view_count: 0,
        share_count: 0,
        like_count: 0,
        indexed_at,
        last_accessed: None,
        sequence: 0,
    }
}

/// Ingest `count` eligible videos with ids `1..=count` into `tenant`
pub async fn seed_videos(index: &ContentIndex, tenant: &str, count: usize) {
    for i in 1..=count {
        index
            .ingest(
                Some(tenant),
                &raw(serde_json::json!({
                    "id": i.to_string(),
                    "name": format!("clip number {}", i),
                    "type": "video",
                    "size": 1_000_000 * i,
                })),
            )
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }
}

/// In-memory store whose operations can be switched to fail with
/// `BackendUnavailable` after seeding
#[derive(Default)]
pub struct FaultyStore {
    inner: InMemoryStore,
    /// `bump` fails
    pub fail_bumps: AtomicBool,
    /// `scan`, `sample` and `aggregate` fail
    pub fail_reads: AtomicBool,
    /// Only unbounded scans (`limit == None`) fail
    pub fail_full_scans: AtomicBool,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check(flag: &AtomicBool, operation: &str) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(AppError::BackendUnavailable(format!("{} offline", operation)));
        }
        Ok(())
    }
}

#[async_trait]
impl FileStore for FaultyStore {
    async fn upsert(&self, record: &FileRecord, policy: ReindexPolicy) -> Result<UpsertOutcome> {
        self.inner.upsert(record, policy).await
    }

    async fn get(&self, key: &RecordKey) -> Result<Option<FileRecord>> {
        self.inner.get(key).await
    }

    async fn delete(&self, key: &RecordKey) -> Result<bool> {
        self.inner.delete(key).await
    }

    async fn scan(
        &self,
        filter: &RecordFilter,
        sort: RecordSort,
        limit: Option<usize>,
    ) -> Result<Vec<FileRecord>> {
        Self::check(&self.fail_reads, "scan")?;
        if limit.is_none() {
            Self::check(&self.fail_full_scans, "full scan")?;
        }
        self.inner.scan(filter, sort, limit).await
    }

    async fn sample(&self, filter: &RecordFilter, size: usize) -> Result<Vec<FileRecord>> {
        Self::check(&self.fail_reads, "sample")?;
        self.inner.sample(filter, size).await
    }

    async fn bump(&self, keys: &[RecordKey], bump: &CounterBump) -> Result<usize> {
        Self::check(&self.fail_bumps, "bump")?;
        self.inner.bump(keys, bump).await
    }

    async fn aggregate(&self, filter: &RecordFilter, group_by: GroupBy) -> Result<Vec<GroupStats>> {
        Self::check(&self.fail_reads, "aggregate")?;
        self.inner.aggregate(filter, group_by).await
    }
}
