use crate::error::{AppError, Result};
use crate::state::ReindexPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// State backend configuration
    #[serde(default)]
    pub state: StateConfig,

    /// Ingestion sanitizer bounds and reindex policy
    #[serde(default)]
    pub indexing: IndexingConfig,

    /// Keyword search configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Random / recent / popular discovery configuration
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("CONTENT_INDEX_CONFIG")
            .unwrap_or_else(|_| "config/content-index.toml".to_string());
        Self::load_from(&config_path)
    }

    /// Load defaults, then `path` if it exists, then `CONTENT_INDEX__*` environment overrides
    pub fn load_from(path: &str) -> Result<Self> {
        let config: Config = config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(path).required(false))
            // Override with CONTENT_INDEX__<SECTION>__<KEY> environment variables
            .add_source(
                config::Environment::with_prefix("CONTENT_INDEX")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.state.operation_timeout_ms == 0 {
            return Err(AppError::Configuration(
                "state.operation_timeout_ms must be greater than zero".to_string(),
            ));
        }

        if self.search.counter_timeout_ms == 0
            || self.search.counter_timeout_ms >= self.state.operation_timeout_ms
        {
            return Err(AppError::Configuration(format!(
                "search.counter_timeout_ms ({}) must be non-zero and below state.operation_timeout_ms ({})",
                self.search.counter_timeout_ms, self.state.operation_timeout_ms
            )));
        }

        if self.search.max_results == 0 {
            return Err(AppError::Configuration(
                "search.max_results must be greater than zero".to_string(),
            ));
        }

        if self.discovery.random_strategies.is_empty() {
            return Err(AppError::Configuration(
                "discovery.random_strategies must name at least one strategy".to_string(),
            ));
        }

        if self.discovery.oversample_factor == 0 {
            return Err(AppError::Configuration(
                "discovery.oversample_factor must be greater than zero".to_string(),
            ));
        }

        let limits = &self.indexing;
        if limits.max_id_len == 0 || limits.max_name_len == 0 || limits.max_tenant_len == 0 {
            return Err(AppError::Configuration(
                "indexing length bounds must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// State backend type
    #[serde(default)]
    pub backend: StateBackend,

    /// Path for embedded database (sled)
    pub path: Option<PathBuf>,

    /// Deadline applied to every store call (milliseconds)
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
}

impl StateConfig {
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            backend: StateBackend::default(),
            path: None,
            operation_timeout_ms: default_operation_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StateBackend {
    #[default]
    Memory,
    Sled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    #[serde(default = "default_max_id_len")]
    pub max_id_len: usize,

    #[serde(default = "default_max_type_len")]
    pub max_type_len: usize,

    #[serde(default = "default_max_tenant_len")]
    pub max_tenant_len: usize,

    #[serde(default = "default_max_name_len")]
    pub max_name_len: usize,

    #[serde(default = "default_max_caption_len")]
    pub max_caption_len: usize,

    #[serde(default = "default_max_quality_len")]
    pub max_quality_len: usize,

    /// What a reindex does with existing usage counters
    #[serde(default)]
    pub reindex_policy: ReindexPolicy,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            max_id_len: default_max_id_len(),
            max_type_len: default_max_type_len(),
            max_tenant_len: default_max_tenant_len(),
            max_name_len: default_max_name_len(),
            max_caption_len: default_max_caption_len(),
            max_quality_len: default_max_quality_len(),
            reindex_policy: ReindexPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Hard cap on any requested limit
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Bump `access_count` / `last_accessed` on returned records
    #[serde(default = "default_true")]
    pub track_access: bool,

    /// Whether the access batch is spawned or awaited
    #[serde(default)]
    pub counter_update_mode: CounterUpdateMode,

    /// Deadline for the access batch (milliseconds); must stay below the store timeout
    #[serde(default = "default_counter_timeout_ms")]
    pub counter_timeout_ms: u64,
}

impl SearchConfig {
    pub fn counter_timeout(&self) -> Duration {
        Duration::from_millis(self.counter_timeout_ms)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            track_access: true,
            counter_update_mode: CounterUpdateMode::default(),
            counter_timeout_ms: default_counter_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CounterUpdateMode {
    /// Fire and forget on a spawned task
    #[default]
    Background,
    /// Awaited before the search returns, still bounded by `counter_timeout_ms`
    Inline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Candidates drawn per requested result in random mode
    #[serde(default = "default_oversample_factor")]
    pub oversample_factor: usize,

    /// Ordered strategies tried by random mode; the first success wins
    #[serde(default = "default_random_strategies")]
    pub random_strategies: Vec<RandomStrategyKind>,

    /// Set `last_accessed` on records returned by discovery
    #[serde(default)]
    pub touch_on_discovery: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            oversample_factor: default_oversample_factor(),
            random_strategies: default_random_strategies(),
            touch_on_discovery: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RandomStrategyKind {
    /// Store-side random sample ranked by quality score
    WeightedSample,
    /// Default-order scan followed by an unweighted local sample
    UniformScan,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

fn default_operation_timeout_ms() -> u64 {
    2000
}

fn default_max_id_len() -> usize {
    64
}

fn default_max_type_len() -> usize {
    32
}

fn default_max_tenant_len() -> usize {
    64
}

fn default_max_name_len() -> usize {
    256
}

fn default_max_caption_len() -> usize {
    1024
}

fn default_max_quality_len() -> usize {
    16
}

fn default_max_results() -> usize {
    100
}

fn default_counter_timeout_ms() -> u64 {
    500
}

fn default_oversample_factor() -> usize {
    2
}

fn default_random_strategies() -> Vec<RandomStrategyKind> {
    vec![
        RandomStrategyKind::WeightedSample,
        RandomStrategyKind::UniformScan,
    ]
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
