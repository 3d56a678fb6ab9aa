//! Deadline wrapper for storage operations.

use crate::error::{AppError, Result};
use crate::models::{FileRecord, RecordKey};
use crate::state::{
    CounterBump, FileStore, GroupBy, GroupStats, RecordFilter, RecordSort, ReindexPolicy,
    UpsertOutcome,
};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Wrapper that bounds every call on any FileStore implementation
pub struct TimeoutStore {
    inner: Arc<dyn FileStore>,
    timeout: Duration,
}

impl TimeoutStore {
    /// Create a new timeout store wrapper
    pub fn new(inner: Arc<dyn FileStore>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn execute<T, F>(&self, operation: &'static str, f: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send,
    {
        match tokio::time::timeout(self.timeout, f).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Store operation timed out"
                );
                Err(AppError::Timeout(format!(
                    "store {} exceeded {:?}",
                    operation, self.timeout
                )))
            }
        }
    }
}

#[async_trait]
impl FileStore for TimeoutStore {
    async fn upsert(&self, record: &FileRecord, policy: ReindexPolicy) -> Result<UpsertOutcome> {
        self.execute("upsert", self.inner.upsert(record, policy)).await
    }

    async fn get(&self, key: &RecordKey) -> Result<Option<FileRecord>> {
        self.execute("get", self.inner.get(key)).await
    }

    async fn delete(&self, key: &RecordKey) -> Result<bool> {
        self.execute("delete", self.inner.delete(key)).await
    }

    async fn scan(
        &self,
        filter: &RecordFilter,
        sort: RecordSort,
        limit: Option<usize>,
    ) -> Result<Vec<FileRecord>> {
        self.execute("scan", self.inner.scan(filter, sort, limit)).await
    }

    async fn sample(&self, filter: &RecordFilter, size: usize) -> Result<Vec<FileRecord>> {
        self.execute("sample", self.inner.sample(filter, size)).await
    }

    async fn bump(&self, keys: &[RecordKey], bump: &CounterBump) -> Result<usize> {
        self.execute("bump", self.inner.bump(keys, bump)).await
    }

    async fn aggregate(&self, filter: &RecordFilter, group_by: GroupBy) -> Result<Vec<GroupStats>> {
        self.execute("aggregate", self.inner.aggregate(filter, group_by)).await
    }
}
