//! Usage counter updates issued by search, discovery and delivery.

use crate::config::CounterUpdateMode;
use crate::error::Result;
use crate::models::RecordKey;
use crate::state::{CounterBump, FileStore};
use std::sync::Arc;
use std::time::Duration;

/// Issues atomic counter bumps against the store
#[derive(Clone)]
pub struct UsageTracker {
    store: Arc<dyn FileStore>,
    mode: CounterUpdateMode,
    timeout: Duration,
}

impl UsageTracker {
    pub fn new(store: Arc<dyn FileStore>, mode: CounterUpdateMode, timeout: Duration) -> Self {
        Self {
            store,
            mode,
            timeout,
        }
    }

    /// Best-effort batch bump. Never fails: errors and timeouts are logged and dropped.
    pub async fn record_batch(&self, keys: Vec<RecordKey>, bump: CounterBump) {
        if keys.is_empty() || bump.is_empty() {
            return;
        }

        match self.mode {
            CounterUpdateMode::Background => {
                let store = self.store.clone();
                let timeout = self.timeout;
                tokio::spawn(async move {
                    Self::apply_batch(store, timeout, keys, bump).await;
                });
            }
            CounterUpdateMode::Inline => {
                Self::apply_batch(self.store.clone(), self.timeout, keys, bump).await;
            }
        }
    }

    /// Bump a single record and report whether it existed. Errors propagate.
    pub async fn record_one(&self, key: RecordKey, bump: CounterBump) -> Result<bool> {
        let updated = tokio::time::timeout(self.timeout, self.store.bump(&[key], &bump)).await??;
        Ok(updated == 1)
    }

    async fn apply_batch(
        store: Arc<dyn FileStore>,
        timeout: Duration,
        keys: Vec<RecordKey>,
        bump: CounterBump,
    ) {
        match tokio::time::timeout(timeout, store.bump(&keys, &bump)).await {
            Ok(Ok(updated)) => {
                tracing::debug!(requested = keys.len(), updated, "Counter batch applied");
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    requested = keys.len(),
                    error = %e,
                    "Counter batch failed; dropping"
                );
            }
            Err(_) => {
                tracing::warn!(
                    requested = keys.len(),
                    timeout_ms = timeout.as_millis() as u64,
                    "Counter batch timed out; dropping"
                );
            }
        }
    }
}
