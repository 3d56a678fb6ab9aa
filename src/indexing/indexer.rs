use crate::error::{AppError, Result};
use crate::indexing::sanitizer::{RawMetadata, SanitizedInput, Sanitizer};
use crate::indexing::tokenizer::extract_keywords;
use crate::models::{is_valid_record_id, FileRecord, RecordKey};
use crate::state::{FileStore, ReindexPolicy, UpsertOutcome};
use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

/// Owns record creation, reindex and removal
pub struct Indexer {
    store: Arc<dyn FileStore>,
    sanitizer: Sanitizer,
    policy: ReindexPolicy,
}

impl Indexer {
    pub fn new(store: Arc<dyn FileStore>, sanitizer: Sanitizer, policy: ReindexPolicy) -> Self {
        Self {
            store,
            sanitizer,
            policy,
        }
    }

    pub fn sanitizer(&self) -> &Sanitizer {
        &self.sanitizer
    }

    /// Sanitize and upsert raw upstream metadata
    pub async fn ingest(&self, tenant_id: Option<&str>, raw: &RawMetadata) -> Result<String> {
        let input = self.sanitizer.normalize(raw, tenant_id);
        self.upsert(input).await
    }

    /// Create or reindex a record.
    ///
    /// Fails with `Validation` when the id is empty or has neither accepted
    /// shape; store failures propagate unchanged.
    pub async fn upsert(&self, input: SanitizedInput) -> Result<String> {
        if input.record_id.is_empty() {
            return Err(AppError::Validation("record id is empty".to_string()));
        }
        if !is_valid_record_id(&input.record_id) {
            return Err(AppError::Validation(format!(
                "record id '{}' is neither numeric nor '<source>_<sequence>'",
                input.record_id
            )));
        }

        let record = Self::build_record(input);
        record.validate()?;

        let outcome = self.store.upsert(&record, self.policy).await?;

        match outcome {
            UpsertOutcome::Created => tracing::info!(
                tenant = ?record.tenant_id,
                record_id = %record.record_id,
                media_type = %record.media_type,
                "Record indexed"
            ),
            UpsertOutcome::Replaced => tracing::info!(
                tenant = ?record.tenant_id,
                record_id = %record.record_id,
                policy = ?self.policy,
                "Record reindexed"
            ),
        }

        Ok(record.record_id)
    }

    /// Remove a record; `false` when nothing was stored under the key
    pub async fn remove(&self, tenant_id: Option<&str>, record_id: &str) -> Result<bool> {
        let key = self.key(tenant_id, record_id);
        let removed = self.store.delete(&key).await?;

        tracing::debug!(record = %key, removed, "Record removal");
        Ok(removed)
    }

    /// Single-record lookup; absent is `Ok(None)`, not an error
    pub async fn get(&self, tenant_id: Option<&str>, record_id: &str) -> Result<Option<FileRecord>> {
        self.store.get(&self.key(tenant_id, record_id)).await
    }

    /// Partition key built from raw caller input, sanitized like ingestion
    pub fn key(&self, tenant_id: Option<&str>, record_id: &str) -> RecordKey {
        RecordKey::new(
            self.sanitizer.tenant(tenant_id),
            self.sanitizer.record_id(record_id),
        )
    }

    fn build_record(input: SanitizedInput) -> FileRecord {
        let keywords = extract_keywords(&input.name, input.caption.as_deref());

        FileRecord {
            record_id: input.record_id,
            tenant_id: input.tenant_id,
            name: input.name,
            caption: input.caption,
            media_type: input.media_type,
            size_bytes: input.size_bytes,
            keywords,
            owner_id: input.owner_id,
            source_ref: input.source_ref,
            quality: input.quality,
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
}
