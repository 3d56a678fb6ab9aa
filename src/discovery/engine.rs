use crate::config::DiscoveryConfig;
use crate::discovery::scoring::rank_by_popularity;
use crate::discovery::strategy::RandomChain;
use crate::models::{is_valid_record_id, FileRecord};
use crate::search::UsageTracker;
use crate::state::{CounterBump, FileStore, RecordFilter, RecordSort};
use chrono::Utc;
use std::sync::Arc;

/// Random, recent and popular browsing over a partition's eligible records
pub struct DiscoveryEngine {
    store: Arc<dyn FileStore>,
    tracker: UsageTracker,
    chain: RandomChain,
    oversample_factor: usize,
    max_results: usize,
    touch_on_discovery: bool,
}

impl DiscoveryEngine {
    pub fn new(
        store: Arc<dyn FileStore>,
        tracker: UsageTracker,
        config: &DiscoveryConfig,
        max_results: usize,
    ) -> Self {
        Self {
            store,
            tracker,
            chain: RandomChain::new(config.random_strategies.clone()),
            oversample_factor: config.oversample_factor,
            max_results,
            touch_on_discovery: config.touch_on_discovery,
        }
    }

    /// Up to `limit` distinct random records, biased towards quality when the
    /// primary strategy works. Invalid ids are dropped; blank names backfilled.
    pub async fn random(&self, tenant_id: Option<&str>, limit: usize) -> Vec<FileRecord> {
        let limit = limit.min(self.max_results);
        if limit == 0 {
            return Vec::new();
        }

        let filter = RecordFilter::for_tenant(tenant_id).eligible_only();
        let Some(candidates) = self
            .chain
            .run(self.store.as_ref(), &filter, limit, self.oversample_factor)
            .await
        else {
            tracing::warn!(tenant = ?tenant_id, "All random strategies failed; returning no results");
            return Vec::new();
        };

        let records: Vec<FileRecord> = candidates
            .into_iter()
            .filter_map(validate_candidate)
            .take(limit)
            .collect();

        tracing::debug!(tenant = ?tenant_id, limit, returned = records.len(), "Random discovery");
        self.touch(&records).await;
        records
    }

    /// Newest eligible records first
    pub async fn recent(&self, tenant_id: Option<&str>, limit: usize) -> Vec<FileRecord> {
        let records = self.recent_inner(tenant_id, limit).await;
        self.touch(&records).await;
        records
    }

    /// Eligible records ranked by popularity score.
    ///
    /// Falls back to [`recent`](Self::recent) when nothing has been
    /// downloaded yet or the candidate scan fails.
    pub async fn popular(&self, tenant_id: Option<&str>, limit: usize) -> Vec<FileRecord> {
        let limit = limit.min(self.max_results);
        if limit == 0 {
            return Vec::new();
        }

        let filter = RecordFilter::for_tenant(tenant_id).eligible_only();
        let records = match self.store.scan(&filter, RecordSort::Insertion, None).await {
            Ok(mut candidates) if candidates.iter().any(|r| r.download_count > 0) => {
                rank_by_popularity(&mut candidates);
                candidates.truncate(limit);
                candidates
            }
            Ok(_) => {
                tracing::debug!(tenant = ?tenant_id, "No downloads yet; popular falls back to recent");
                self.recent_inner(tenant_id, limit).await
            }
            Err(e) => {
                tracing::warn!(
                    tenant = ?tenant_id,
                    error = %e,
                    "Popular scan failed; falling back to recent"
                );
                self.recent_inner(tenant_id, limit).await
            }
        };

        self.touch(&records).await;
        records
    }

    async fn recent_inner(&self, tenant_id: Option<&str>, limit: usize) -> Vec<FileRecord> {
        let limit = limit.min(self.max_results);
        if limit == 0 {
            return Vec::new();
        }

        let filter = RecordFilter::for_tenant(tenant_id).eligible_only();
        match self
            .store
            .scan(&filter, RecordSort::IndexedAtDesc, Some(limit))
            .await
        {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    tenant = ?tenant_id,
                    error = %e,
                    "Recent scan failed; returning no results"
                );
                Vec::new()
            }
        }
    }

    async fn touch(&self, records: &[FileRecord]) {
        if !self.touch_on_discovery || records.is_empty() {
            return;
        }
        let keys = records.iter().map(FileRecord::key).collect();
        self.tracker
            .record_batch(keys, CounterBump::new().touch(Utc::now()))
            .await;
    }
}

/// Reject records whose id has no accepted shape; name blank records `File_<id>`
pub fn validate_candidate(mut record: FileRecord) -> Option<FileRecord> {
    if !is_valid_record_id(&record.record_id) {
        tracing::debug!(record_id = %record.record_id, "Dropping discovery candidate with invalid id");
        return None;
    }

    if record.name.trim().is_empty() {
        record.name = format!("File_{}", record.record_id);
    }

    Some(record)
}
