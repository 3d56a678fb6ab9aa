//! Caller-facing facade over indexing, search, discovery and analytics.

use crate::analytics::{AnalyticsAggregator, DetailedTenantStats, TenantStats};
use crate::config::Config;
use crate::discovery::DiscoveryEngine;
use crate::error::Result;
use crate::indexing::{Indexer, RawMetadata, Sanitizer};
use crate::models::{CounterField, FileRecord};
use crate::search::{SearchEngine, UsageTracker};
use crate::state::{create_store, CounterBump, FileStore};
use chrono::Utc;
use std::sync::Arc;

/// The content index as seen by command handlers and dashboards.
///
/// Every method takes the caller's raw tenant id and sanitizes it the same
/// way ingestion does, so `" A "` and `"A"` address the same partition and
/// a blank tenant means the global partition.
pub struct ContentIndex {
    indexer: Indexer,
    search: SearchEngine,
    discovery: DiscoveryEngine,
    analytics: AnalyticsAggregator,
    tracker: UsageTracker,
}

impl ContentIndex {
    /// Wire every component to an already created store.
    ///
    /// Fails with `Configuration` when `config` does not pass
    /// [`Config::validate`].
    pub fn new(store: Arc<dyn FileStore>, config: &Config) -> Result<Self> {
        config.validate()?;

        let tracker = UsageTracker::new(
            store.clone(),
            config.search.counter_update_mode,
            config.search.counter_timeout(),
        );

        let indexer = Indexer::new(
            store.clone(),
            Sanitizer::new(config.indexing.clone()),
            config.indexing.reindex_policy,
        );
        let search = SearchEngine::new(store.clone(), tracker.clone(), config.search.clone());
        let discovery = DiscoveryEngine::new(
            store.clone(),
            tracker.clone(),
            &config.discovery,
            config.search.max_results,
        );
        let analytics = AnalyticsAggregator::new(store);

        Ok(Self {
            indexer,
            search,
            discovery,
            analytics,
            tracker,
        })
    }

    /// Create the configured store and wire the index to it
    pub async fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let store = create_store(&config.state).await?;
        Self::new(store, config)
    }

    /// Index raw metadata; returns the stored record id
    pub async fn ingest(&self, tenant_id: Option<&str>, raw: &RawMetadata) -> Result<String> {
        self.indexer.ingest(tenant_id, raw).await
    }

    pub async fn remove(&self, tenant_id: Option<&str>, record_id: &str) -> Result<bool> {
        self.indexer.remove(tenant_id, record_id).await
    }

    pub async fn get(&self, tenant_id: Option<&str>, record_id: &str) -> Result<Option<FileRecord>> {
        self.indexer.get(tenant_id, record_id).await
    }

    pub async fn search(&self, tenant_id: Option<&str>, query: &str, limit: usize) -> Vec<FileRecord> {
        let tenant = self.tenant(tenant_id);
        self.search.search(tenant.as_deref(), query, limit).await
    }

    pub async fn random(&self, tenant_id: Option<&str>, limit: usize) -> Vec<FileRecord> {
        let tenant = self.tenant(tenant_id);
        self.discovery.random(tenant.as_deref(), limit).await
    }

    pub async fn recent(&self, tenant_id: Option<&str>, limit: usize) -> Vec<FileRecord> {
        let tenant = self.tenant(tenant_id);
        self.discovery.recent(tenant.as_deref(), limit).await
    }

    pub async fn popular(&self, tenant_id: Option<&str>, limit: usize) -> Vec<FileRecord> {
        let tenant = self.tenant(tenant_id);
        self.discovery.popular(tenant.as_deref(), limit).await
    }

    pub async fn stats(&self, tenant_id: Option<&str>) -> TenantStats {
        let tenant = self.tenant(tenant_id);
        self.analytics.stats(tenant.as_deref()).await
    }

    pub async fn detailed_stats(&self, tenant_id: Option<&str>) -> Option<DetailedTenantStats> {
        let tenant = self.tenant(tenant_id);
        self.analytics.detailed_stats(tenant.as_deref()).await
    }

    /// Count a delivery. Downloads also count as an access.
    pub async fn record_download(&self, tenant_id: Option<&str>, record_id: &str) -> Result<bool> {
        let bump = CounterBump::new()
            .increment(CounterField::Download, 1)
            .increment(CounterField::Access, 1);
        self.record_usage(tenant_id, record_id, bump).await
    }

    pub async fn record_view(&self, tenant_id: Option<&str>, record_id: &str) -> Result<bool> {
        let bump = CounterBump::new().increment(CounterField::View, 1);
        self.record_usage(tenant_id, record_id, bump).await
    }

    pub async fn record_share(&self, tenant_id: Option<&str>, record_id: &str) -> Result<bool> {
        let bump = CounterBump::new().increment(CounterField::Share, 1);
        self.record_usage(tenant_id, record_id, bump).await
    }

    pub async fn record_like(&self, tenant_id: Option<&str>, record_id: &str) -> Result<bool> {
        let bump = CounterBump::new().increment(CounterField::Like, 1);
        self.record_usage(tenant_id, record_id, bump).await
    }

    async fn record_usage(
        &self,
        tenant_id: Option<&str>,
        record_id: &str,
        bump: CounterBump,
    ) -> Result<bool> {
        let key = self.indexer.key(tenant_id, record_id);
        let updated = self
            .tracker
            .record_one(key.clone(), bump.touch(Utc::now()))
            .await?;

        if !updated {
            tracing::debug!(record = %key, "Usage recorded for missing record");
        }
        Ok(updated)
    }

    fn tenant(&self, tenant_id: Option<&str>) -> Option<String> {
        self.indexer.sanitizer().tenant(tenant_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CounterUpdateMode;
    use crate::error::AppError;
    use crate::state::create_in_memory_store;
    use serde_json::json;

    fn index() -> ContentIndex {
        let mut config = Config::default();
        config.search.counter_update_mode = CounterUpdateMode::Inline;
        ContentIndex::new(create_in_memory_store(), &config).unwrap()
    }

    fn raw(value: serde_json::Value) -> RawMetadata {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_tenant_is_sanitized_on_every_path() {
        let index = index();
        index
            .ingest(Some(" A "), &raw(json!({"id": "1", "name": "holiday clip", "type": "video"})))
            .await
            .unwrap();

        assert!(index.get(Some("A"), "1").await.unwrap().is_some());
        assert_eq!(index.search(Some("A "), "holiday", 10).await.len(), 1);
        assert_eq!(index.recent(Some("A"), 10).await.len(), 1);
        assert_eq!(index.stats(Some("  A")).await.total_files, 1);
        assert!(index.recent(None, 10).await.is_empty());
    }

    #[tokio::test]
    async fn test_record_download_bumps_download_and_access() {
        let index = index();
        index
            .ingest(Some("A"), &raw(json!({"id": "7", "name": "report", "type": "document"})))
            .await
            .unwrap();

        assert!(index.record_download(Some("A"), "7").await.unwrap());
        assert!(index.record_like(Some("A"), "7").await.unwrap());
        assert!(!index.record_view(Some("A"), "8").await.unwrap());

        let record = index.get(Some("A"), "7").await.unwrap().unwrap();
        assert_eq!(record.download_count, 1);
        assert_eq!(record.access_count, 1);
        assert_eq!(record.like_count, 1);
        assert_eq!(record.view_count, 0);
        assert!(record.last_accessed.is_some());
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = Config::default();
        config.discovery.random_strategies.clear();
        let result = ContentIndex::new(create_in_memory_store(), &config);
        assert!(matches!(result, Err(AppError::Configuration(_))));

        let mut config = Config::default();
        config.search.counter_timeout_ms = config.state.operation_timeout_ms;
        let result = ContentIndex::new(create_in_memory_store(), &config);
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }
}
