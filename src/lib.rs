//! Multi-tenant content index with keyword search, random / recent /
//! popular discovery and per-tenant usage analytics.
//!
//! ```no_run
//! use content_index::{Config, ContentIndex, RawMetadata};
//!
//! #[tokio::main]
//! async fn main() -> content_index::Result<()> {
//!     let config = Config::load()?;
//!     let index = ContentIndex::from_config(&config).await?;
//!
//!     let raw: RawMetadata = serde_json::from_str(
//!         r#"{"id": "100_5", "name": "Movie.mkv", "caption": "Great film", "type": "video"}"#,
//!     )?;
//!     index.ingest(Some("A"), &raw).await?;
//!
//!     for record in index.search(Some("A"), "great", 10).await {
//!         println!("{} {}", record.record_id, record.name);
//!     }
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod indexing;
pub mod models;
pub mod search;
pub mod state;

pub use analytics::{DetailedTenantStats, TenantStats};
pub use config::Config;
pub use engine::ContentIndex;
pub use error::{AppError, Result};
pub use indexing::RawMetadata;
pub use models::{FileRecord, MediaType};
pub use state::FileStore;
