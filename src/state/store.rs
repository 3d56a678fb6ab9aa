use crate::error::Result;
use crate::models::{FileRecord, RecordKey};
use crate::state::{
    aggregate_records, CounterBump, FileStore, GroupBy, GroupStats, RecordFilter, RecordSort,
    ReindexPolicy, UpsertOutcome,
};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::seq::IndexedRandom;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// In-memory record store (for development and testing)
#[derive(Clone)]
pub struct InMemoryStore {
    records: Arc<DashMap<RecordKey, FileRecord>>,
    next_sequence: Arc<AtomicU64>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(DashMap::new()),
            next_sequence: Arc::new(AtomicU64::new(1)),
        }
    }

    fn matching(&self, filter: &RecordFilter) -> Vec<FileRecord> {
        self.records
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileStore for InMemoryStore {
    async fn upsert(&self, record: &FileRecord, policy: ReindexPolicy) -> Result<UpsertOutcome> {
        let key = record.key();

        // The entry guard holds the shard lock, so concurrent bumps cannot interleave
        let outcome = match self.records.entry(key) {
            Entry::Occupied(mut occupied) => {
                let mut replacement = record.clone();
                match policy {
                    ReindexPolicy::PreserveCounters => replacement.inherit_usage(occupied.get()),
                    ReindexPolicy::ReplaceAll => replacement.sequence = occupied.get().sequence,
                }
                occupied.insert(replacement);
                UpsertOutcome::Replaced
            }
            Entry::Vacant(vacant) => {
                let mut fresh = record.clone();
                fresh.sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
                vacant.insert(fresh);
                UpsertOutcome::Created
            }
        };

        tracing::debug!(record = %record.key(), ?outcome, "Record upserted");
        Ok(outcome)
    }

    async fn get(&self, key: &RecordKey) -> Result<Option<FileRecord>> {
        Ok(self.records.get(key).map(|entry| entry.clone()))
    }

    async fn delete(&self, key: &RecordKey) -> Result<bool> {
        let removed = self.records.remove(key).is_some();
        if removed {
            tracing::debug!(record = %key, "Record deleted");
        }
        Ok(removed)
    }

    async fn scan(
        &self,
        filter: &RecordFilter,
        sort: RecordSort,
        limit: Option<usize>,
    ) -> Result<Vec<FileRecord>> {
        let mut records = self.matching(filter);
        sort.apply(&mut records);
        if let Some(limit) = limit {
            records.truncate(limit);
        }
        Ok(records)
    }

    async fn sample(&self, filter: &RecordFilter, size: usize) -> Result<Vec<FileRecord>> {
        let pool = self.matching(filter);
        let mut rng = rand::rng();
        Ok(pool.choose_multiple(&mut rng, size).cloned().collect())
    }

    async fn bump(&self, keys: &[RecordKey], bump: &CounterBump) -> Result<usize> {
        let mut updated = 0;
        for key in keys {
            if let Some(mut entry) = self.records.get_mut(key) {
                bump.apply(entry.value_mut());
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn aggregate(&self, filter: &RecordFilter, group_by: GroupBy) -> Result<Vec<GroupStats>> {
        let records = self.matching(filter);
        Ok(aggregate_records(&records, group_by))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CounterField, MediaType};
    use chrono::{Duration, Utc};

    fn create_test_record(tenant: Option<&str>, id: &str) -> FileRecord {
        FileRecord {
            record_id: id.to_string(),
            tenant_id: tenant.map(str::to_string),
            name: format!("file {}", id),
            caption: None,
            media_type: MediaType::Video,
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
            indexed_at: Utc::now(),
            last_accessed: None,
            sequence: 0,
        }
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let store = InMemoryStore::new();
        let record = create_test_record(Some("A"), "1");

        let outcome = store
            .upsert(&record, ReindexPolicy::PreserveCounters)
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Created);

        let retrieved = store.get(&record.key()).await.unwrap().unwrap();
        assert_eq!(retrieved.record_id, "1");
        assert!(retrieved.sequence > 0);
    }

    #[tokio::test]
    async fn test_reindex_preserves_counters() {
        let store = InMemoryStore::new();
        let record = create_test_record(Some("A"), "1");
        store
            .upsert(&record, ReindexPolicy::PreserveCounters)
            .await
            .unwrap();

        let bump = CounterBump::new().increment(CounterField::Download, 3);
        store.bump(&[record.key()], &bump).await.unwrap();

        let outcome = store
            .upsert(&record, ReindexPolicy::PreserveCounters)
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Replaced);

        let retrieved = store.get(&record.key()).await.unwrap().unwrap();
        assert_eq!(retrieved.download_count, 3);
    }

    #[tokio::test]
    async fn test_replace_all_resets_counters() {
        let store = InMemoryStore::new();
        let record = create_test_record(None, "1");
        store.upsert(&record, ReindexPolicy::ReplaceAll).await.unwrap();
        store
            .bump(&[record.key()], &CounterBump::new().increment(CounterField::View, 2))
            .await
            .unwrap();

        store.upsert(&record, ReindexPolicy::ReplaceAll).await.unwrap();
        let retrieved = store.get(&record.key()).await.unwrap().unwrap();
        assert_eq!(retrieved.view_count, 0);
    }

    #[tokio::test]
    async fn test_scan_sorts_newest_first() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        for i in 0..3 {
            let mut record = create_test_record(Some("A"), &i.to_string());
            record.indexed_at = now - Duration::minutes(i);
            store.upsert(&record, ReindexPolicy::default()).await.unwrap();
        }

        let records = store
            .scan(&RecordFilter::for_tenant(Some("A")), RecordSort::IndexedAtDesc, Some(2))
            .await
            .unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.record_id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1"]);
    }

    #[tokio::test]
    async fn test_sample_is_distinct_and_bounded() {
        let store = InMemoryStore::new();
        for i in 0..3 {
            store
                .upsert(&create_test_record(Some("A"), &i.to_string()), ReindexPolicy::default())
                .await
                .unwrap();
        }

        let sample = store
            .sample(&RecordFilter::for_tenant(Some("A")), 10)
            .await
            .unwrap();
        assert_eq!(sample.len(), 3);
        let mut ids: Vec<_> = sample.iter().map(|r| r.record_id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_bumps_do_not_lose_updates() {
        let store = Arc::new(InMemoryStore::new());
        let record = create_test_record(Some("A"), "1");
        store.upsert(&record, ReindexPolicy::default()).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            let key = record.key();
            handles.push(tokio::spawn(async move {
                let bump = CounterBump::new().increment(CounterField::Access, 1);
                store.bump(&[key], &bump).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let retrieved = store.get(&record.key()).await.unwrap().unwrap();
        assert_eq!(retrieved.access_count, 50);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = InMemoryStore::new();
        let record = create_test_record(None, "1");
        store.upsert(&record, ReindexPolicy::default()).await.unwrap();

        assert!(store.delete(&record.key()).await.unwrap());
        assert!(!store.delete(&record.key()).await.unwrap());
    }
}
