//! Per-tenant usage analytics.
//!
//! Every figure is computed from grouped store aggregation (count, size sum
//! and latest `indexed_at` per group), never from a full record scan in the
//! engine. Empty partitions and store failures both yield zeroed stats with
//! the "never indexed" sentinel, except that detailed stats report a store
//! failure as `None`.

mod aggregator;
mod stats;

pub use aggregator::AnalyticsAggregator;
pub use stats::{DayCount, DetailedTenantStats, SourceCount, TenantStats, TOP_SOURCES};
