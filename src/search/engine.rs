use crate::config::SearchConfig;
use crate::indexing::tokenize_query;
use crate::models::{CounterField, FileRecord};
use crate::search::tracking::UsageTracker;
use crate::state::{CounterBump, FileStore, RecordFilter, RecordSort};
use chrono::Utc;
use std::sync::Arc;

/// Token-based keyword search over one partition
pub struct SearchEngine {
    store: Arc<dyn FileStore>,
    tracker: UsageTracker,
    config: SearchConfig,
}

impl SearchEngine {
    pub fn new(store: Arc<dyn FileStore>, tracker: UsageTracker, config: SearchConfig) -> Self {
        Self {
            store,
            tracker,
            config,
        }
    }

    /// Records where any query token is a case-insensitive substring of the
    /// name, caption or a keyword; newest first, at most `limit`.
    ///
    /// Blank queries return nothing without touching the store. Store
    /// failures are logged and yield an empty list.
    pub async fn search(&self, tenant_id: Option<&str>, query: &str, limit: usize) -> Vec<FileRecord> {
        if query.trim().is_empty() {
            return Vec::new();
        }

        let tokens = tokenize_query(query);
        let limit = limit.min(self.config.max_results);
        if tokens.is_empty() || limit == 0 {
            return Vec::new();
        }

        let filter = RecordFilter::for_tenant(tenant_id).with_any_text(tokens);
        let records = match self
            .store
            .scan(&filter, RecordSort::IndexedAtDesc, Some(limit))
            .await
        {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    tenant = ?tenant_id,
                    error = %e,
                    error_code = e.error_code(),
                    "Search scan failed; returning no results"
                );
                return Vec::new();
            }
        };

        tracing::debug!(tenant = ?tenant_id, query, hits = records.len(), "Search executed");

        if self.config.track_access && !records.is_empty() {
            let keys = records.iter().map(FileRecord::key).collect();
            let bump = CounterBump::new()
                .increment(CounterField::Access, 1)
                .touch(Utc::now());
            self.tracker.record_batch(keys, bump).await;
        }

        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CounterUpdateMode;
    use crate::indexing::{Indexer, RawMetadata, Sanitizer};
    use crate::state::{InMemoryStore, ReindexPolicy};
    use serde_json::json;
    use std::time::Duration;

    async fn setup() -> (SearchEngine, Indexer, Arc<dyn FileStore>) {
        let store: Arc<dyn FileStore> = Arc::new(InMemoryStore::new());
        let indexer = Indexer::new(store.clone(), Sanitizer::default(), ReindexPolicy::default());
        let tracker = UsageTracker::new(
            store.clone(),
            CounterUpdateMode::Inline,
            Duration::from_millis(500),
        );
        let engine = SearchEngine::new(store.clone(), tracker, SearchConfig::default());
        (engine, indexer, store)
    }

    fn raw(value: serde_json::Value) -> RawMetadata {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_blank_query_returns_empty() {
        let (engine, indexer, _) = setup().await;
        indexer
            .ingest(Some("A"), &raw(json!({"id": "1", "name": "anything"})))
            .await
            .unwrap();

        assert!(engine.search(Some("A"), "", 10).await.is_empty());
        assert!(engine.search(Some("A"), "   \t", 10).await.is_empty());
        assert!(engine.search(Some("A"), "?!", 10).await.is_empty());
    }

    #[tokio::test]
    async fn test_short_query_tokens_match() {
        let (engine, indexer, _) = setup().await;
        indexer
            .ingest(Some("A"), &raw(json!({"id": "1", "name": "Up.2009.mkv"})))
            .await
            .unwrap();

        // "up" is too short to be a keyword but still matches the name
        let hits = engine.search(Some("A"), "UP", 10).await;
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_search_bumps_access_count() {
        let (engine, indexer, store) = setup().await;
        indexer
            .ingest(Some("A"), &raw(json!({"id": "1", "name": "report.pdf"})))
            .await
            .unwrap();

        let hits = engine.search(Some("A"), "report", 10).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].access_count, 0);

        let stored = store.get(&hits[0].key()).await.unwrap().unwrap();
        assert_eq!(stored.access_count, 1);
        assert!(stored.last_accessed.is_some());
    }

    #[tokio::test]
    async fn test_limit_is_applied_newest_first() {
        let (engine, indexer, _) = setup().await;
        for i in 1..=5 {
            indexer
                .ingest(Some("A"), &raw(json!({"id": i.to_string(), "name": format!("episode {}", i)})))
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        let hits = engine.search(Some("A"), "episode", 3).await;
        let ids: Vec<_> = hits.iter().map(|r| r.record_id.as_str()).collect();
        assert_eq!(ids, vec!["5", "4", "3"]);
    }
}
