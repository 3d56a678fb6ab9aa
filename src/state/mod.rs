pub mod factory;
pub mod query;
pub mod sled_store;
pub mod store;
pub mod timeout_store;

pub use factory::{create_in_memory_store, create_store};
pub use query::*;
pub use sled_store::SledStore;
pub use store::InMemoryStore;
pub use timeout_store::TimeoutStore;

use crate::error::Result;
use crate::models::{FileRecord, RecordKey};
use async_trait::async_trait;

/// Outcome of an upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Replaced,
}

/// Trait for file record storage operations.
///
/// Every query is partition-scoped through [`RecordFilter`]. Counter
/// mutation only happens through [`FileStore::bump`], which backends must
/// apply atomically per record.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Insert or replace the record under its partition key
    async fn upsert(&self, record: &FileRecord, policy: ReindexPolicy) -> Result<UpsertOutcome>;

    /// Get a record by key
    async fn get(&self, key: &RecordKey) -> Result<Option<FileRecord>>;

    /// Delete a record; `false` when the key did not exist
    async fn delete(&self, key: &RecordKey) -> Result<bool>;

    /// Filtered scan with ordering and optional limit
    async fn scan(
        &self,
        filter: &RecordFilter,
        sort: RecordSort,
        limit: Option<usize>,
    ) -> Result<Vec<FileRecord>>;

    /// Uniform random sample of up to `size` distinct matching records
    async fn sample(&self, filter: &RecordFilter, size: usize) -> Result<Vec<FileRecord>>;

    /// Apply a counter bump to every existing key; returns how many records were updated
    async fn bump(&self, keys: &[RecordKey], bump: &CounterBump) -> Result<usize>;

    /// Grouped count / size sum / max `indexed_at` over matching records
    async fn aggregate(&self, filter: &RecordFilter, group_by: GroupBy) -> Result<Vec<GroupStats>>;

    /// Count records matching filter
    async fn count(&self, filter: &RecordFilter) -> Result<u64> {
        let groups = self.aggregate(filter, GroupBy::None).await?;
        Ok(groups.iter().map(|g| g.count).sum())
    }
}
