use crate::error::{AppError, Result};
use crate::models::{FileRecord, RecordKey};
use crate::state::{
    aggregate_records, CounterBump, FileStore, GroupBy, GroupStats, RecordFilter, RecordSort,
    ReindexPolicy, UpsertOutcome,
};
use async_trait::async_trait;
use rand::seq::IndexedRandom;
use sled::Db;
use std::path::Path;
use std::sync::Arc;

/// Persistent record store using Sled embedded database.
///
/// Keys are `RecordKey::to_bytes()`, so every partition is a contiguous
/// prefix range and a tenant query never touches other partitions.
#[derive(Clone)]
pub struct SledStore {
    db: Arc<Db>,
    records_tree: sled::Tree,
}

impl SledStore {
    /// Create a new Sled store at the specified path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref();
        let db = sled::open(&path).map_err(|e| {
            AppError::BackendUnavailable(format!("Failed to open Sled database: {}", e))
        })?;

        let records_tree = db.open_tree("records").map_err(|e| {
            AppError::BackendUnavailable(format!("Failed to open records tree: {}", e))
        })?;

        tracing::info!("Initialized Sled store at {:?}", path_str);

        Ok(Self {
            db: Arc::new(db),
            records_tree,
        })
    }

    /// Serialize record to bytes
    fn serialize_record(record: &FileRecord) -> Result<Vec<u8>> {
        bincode::serialize(record).map_err(|e| {
            AppError::Serialization(format!("Failed to serialize record: {}", e))
        })
    }

    /// Deserialize record from bytes
    fn deserialize_record(bytes: &[u8]) -> Result<FileRecord> {
        bincode::deserialize(bytes).map_err(|e| {
            AppError::Serialization(format!("Failed to deserialize record: {}", e))
        })
    }

    /// Decode every record of the filter's partition that matches it
    fn matching(&self, filter: &RecordFilter) -> Result<Vec<FileRecord>> {
        let prefix = RecordKey::partition_prefix(filter.scope.tenant_id());
        let mut records = Vec::new();

        for result in self.records_tree.scan_prefix(prefix) {
            let (_, value) = result.map_err(|e| {
                AppError::BackendUnavailable(format!("Failed to iterate records: {}", e))
            })?;

            let record = Self::deserialize_record(&value)?;
            if filter.matches(&record) {
                records.push(record);
            }
        }

        Ok(records)
    }

    /// Flush pending writes to disk
    pub async fn flush(&self) -> Result<()> {
        self.db.flush_async().await.map_err(|e| {
            AppError::BackendUnavailable(format!("Failed to flush database: {}", e))
        })?;
        Ok(())
    }

    /// Run `f` against a clone of this store on the blocking pool
    async fn offload<T, F>(&self, operation: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(SledStore) -> Result<T> + Send + 'static,
    {
        let store = self.clone();
        run_blocking(operation, move || f(store)).await
    }

    fn upsert_blocking(&self, record: &FileRecord, policy: ReindexPolicy) -> Result<UpsertOutcome> {
        let key = record.key().to_bytes();
        let fresh_sequence = self.db.generate_id()?;
        let mut failure: Option<AppError> = None;

        // fetch_and_update retries the closure on contention, so it must stay pure
        let previous = self.records_tree.fetch_and_update(&key, |old| {
            let mut next = record.clone();
            match old.map(Self::deserialize_record) {
                Some(Ok(existing)) => match policy {
                    ReindexPolicy::PreserveCounters => next.inherit_usage(&existing),
                    ReindexPolicy::ReplaceAll => next.sequence = existing.sequence,
                },
                _ => next.sequence = fresh_sequence,
            }

            match Self::serialize_record(&next) {
                Ok(bytes) => {
                    failure = None;
                    Some(bytes)
                }
                Err(e) => {
                    failure = Some(e);
                    old.map(|bytes| bytes.to_vec())
                }
            }
        })?;

        if let Some(e) = failure {
            return Err(e);
        }

        self.records_tree.flush().map_err(|e| {
            AppError::BackendUnavailable(format!("Failed to flush records tree: {}", e))
        })?;

        let outcome = if previous.is_some() {
            UpsertOutcome::Replaced
        } else {
            UpsertOutcome::Created
        };

        tracing::debug!(record = %record.key(), ?outcome, "Record upserted in Sled");
        Ok(outcome)
    }

    fn get_blocking(&self, key: &RecordKey) -> Result<Option<FileRecord>> {
        match self.records_tree.get(key.to_bytes()) {
            Ok(Some(bytes)) => Ok(Some(Self::deserialize_record(&bytes)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(AppError::BackendUnavailable(format!(
                "Failed to get record: {}",
                e
            ))),
        }
    }

    fn delete_blocking(&self, key: &RecordKey) -> Result<bool> {
        let removed = self.records_tree.remove(key.to_bytes()).map_err(|e| {
            AppError::BackendUnavailable(format!("Failed to delete record: {}", e))
        })?;

        if removed.is_some() {
            self.records_tree.flush().map_err(|e| {
                AppError::BackendUnavailable(format!("Failed to flush records tree: {}", e))
            })?;
            tracing::debug!(record = %key, "Record deleted from Sled");
        }

        Ok(removed.is_some())
    }

    fn bump_blocking(&self, keys: &[RecordKey], bump: &CounterBump) -> Result<usize> {
        let mut updated = 0;

        for key in keys {
            let mut failure: Option<AppError> = None;
            let next = self.records_tree.update_and_fetch(key.to_bytes(), |old| {
                let old = old?;
                let encoded = Self::deserialize_record(old).and_then(|mut record| {
                    bump.apply(&mut record);
                    Self::serialize_record(&record)
                });
                match encoded {
                    Ok(bytes) => {
                        failure = None;
                        Some(bytes)
                    }
                    Err(e) => {
                        failure = Some(e);
                        Some(old.to_vec())
                    }
                }
            })?;

            if let Some(e) = failure {
                return Err(e);
            }
            if next.is_some() {
                updated += 1;
            }
        }

        Ok(updated)
    }
}

/// Run synchronous storage work on tokio's blocking pool.
///
/// The returned future yields while `f` runs, so a surrounding
/// `tokio::time::timeout` can give up on it. The work itself still runs to
/// completion in the background.
pub(crate) async fn run_blocking<T, F>(operation: &'static str, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        AppError::Internal(format!("Sled {} task failed: {}", operation, e))
    })?
}

#[async_trait]
impl FileStore for SledStore {
    async fn upsert(&self, record: &FileRecord, policy: ReindexPolicy) -> Result<UpsertOutcome> {
        let record = record.clone();
        self.offload("upsert", move |store| store.upsert_blocking(&record, policy))
            .await
    }

    async fn get(&self, key: &RecordKey) -> Result<Option<FileRecord>> {
        let key = key.clone();
        self.offload("get", move |store| store.get_blocking(&key)).await
    }

    async fn delete(&self, key: &RecordKey) -> Result<bool> {
        let key = key.clone();
        self.offload("delete", move |store| store.delete_blocking(&key))
            .await
    }

    async fn scan(
        &self,
        filter: &RecordFilter,
        sort: RecordSort,
        limit: Option<usize>,
    ) -> Result<Vec<FileRecord>> {
        let filter = filter.clone();
        self.offload("scan", move |store| {
            let mut records = store.matching(&filter)?;
            sort.apply(&mut records);
            if let Some(limit) = limit {
                records.truncate(limit);
            }
            Ok(records)
        })
        .await
    }

    async fn sample(&self, filter: &RecordFilter, size: usize) -> Result<Vec<FileRecord>> {
        let filter = filter.clone();
        self.offload("sample", move |store| {
            let pool = store.matching(&filter)?;
            let mut rng = rand::rng();
            Ok(pool.choose_multiple(&mut rng, size).cloned().collect())
        })
        .await
    }

    async fn bump(&self, keys: &[RecordKey], bump: &CounterBump) -> Result<usize> {
        let keys = keys.to_vec();
        let bump = bump.clone();
        self.offload("bump", move |store| store.bump_blocking(&keys, &bump))
            .await
    }

    async fn aggregate(&self, filter: &RecordFilter, group_by: GroupBy) -> Result<Vec<GroupStats>> {
        let filter = filter.clone();
        self.offload("aggregate", move |store| {
            let records = store.matching(&filter)?;
            Ok(aggregate_records(&records, group_by))
        })
        .await
    }
}
