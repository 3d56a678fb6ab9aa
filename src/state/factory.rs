use crate::config::{StateBackend, StateConfig};
use crate::error::{AppError, Result};
use crate::state::{FileStore, InMemoryStore, SledStore, TimeoutStore};
use std::sync::Arc;

/// Create a record store based on configuration.
///
/// The returned store already enforces `operation_timeout_ms` on every call.
pub async fn create_store(config: &StateConfig) -> Result<Arc<dyn FileStore>> {
    let inner: Arc<dyn FileStore> = match config.backend {
        StateBackend::Sled => {
            let path = config.path.as_ref().ok_or_else(|| {
                AppError::Configuration("Sled backend requires 'path' configuration".to_string())
            })?;

            tracing::info!(path = ?path, "Initializing Sled storage backend");

            Arc::new(SledStore::new(path)?)
        }

        StateBackend::Memory => {
            tracing::info!("Initializing in-memory storage backend");
            Arc::new(InMemoryStore::new())
        }
    };

    Ok(Arc::new(TimeoutStore::new(inner, config.operation_timeout())))
}

/// Create an in-memory store (for testing and development)
pub fn create_in_memory_store() -> Arc<dyn FileStore> {
    tracing::info!("Initializing in-memory storage backend");
    Arc::new(InMemoryStore::new())
}
