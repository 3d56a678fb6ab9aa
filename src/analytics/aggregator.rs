use crate::analytics::stats::{DayCount, DetailedTenantStats, SourceCount, TenantStats, TOP_SOURCES};
use crate::error::Result;
use crate::models::MediaType;
use crate::state::{FileStore, GroupBy, GroupStats, RecordFilter};
use chrono::{Duration, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Read-only per-partition roll-ups built on store aggregation
pub struct AnalyticsAggregator {
    store: Arc<dyn FileStore>,
}

impl AnalyticsAggregator {
    pub fn new(store: Arc<dyn FileStore>) -> Self {
        Self { store }
    }

    /// Summary stats; zeroed stats when the partition is empty or the store fails
    pub async fn stats(&self, tenant_id: Option<&str>) -> TenantStats {
        match self.try_stats(tenant_id).await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!(
                    tenant = ?tenant_id,
                    error = %e,
                    error_code = e.error_code(),
                    "Stats aggregation failed; returning empty stats"
                );
                TenantStats::empty(tenant_id)
            }
        }
    }

    /// Detailed stats; `None` only when the store fails
    pub async fn detailed_stats(&self, tenant_id: Option<&str>) -> Option<DetailedTenantStats> {
        match self.try_detailed_stats(tenant_id).await {
            Ok(stats) => Some(stats),
            Err(e) => {
                tracing::warn!(
                    tenant = ?tenant_id,
                    error = %e,
                    error_code = e.error_code(),
                    "Detailed stats aggregation failed"
                );
                None
            }
        }
    }

    async fn try_stats(&self, tenant_id: Option<&str>) -> Result<TenantStats> {
        let filter = RecordFilter::for_tenant(tenant_id);
        let by_type = self.store.aggregate(&filter, GroupBy::MediaType).await?;
        Ok(summarize(tenant_id, &by_type))
    }

    async fn try_detailed_stats(&self, tenant_id: Option<&str>) -> Result<DetailedTenantStats> {
        let filter = RecordFilter::for_tenant(tenant_id);
        let recent_filter = filter.clone().indexed_since(Utc::now() - Duration::days(7));

        let (by_type, by_quality, by_source, by_day, files_last_7_days) = futures::try_join!(
            self.store.aggregate(&filter, GroupBy::MediaType),
            self.store.aggregate(&filter, GroupBy::Quality),
            self.store.aggregate(&filter, GroupBy::Source),
            self.store.aggregate(&filter, GroupBy::IndexedDay),
            self.store.count(&recent_filter),
        )?;

        let stats = DetailedTenantStats {
            summary: summarize(tenant_id, &by_type),
            quality_breakdown: quality_breakdown(&by_quality),
            top_sources: top_sources(&by_source),
            most_active_day: most_active_day(&by_day),
            files_last_7_days,
        };

        tracing::debug!(
            tenant = ?tenant_id,
            total_files = stats.summary.total_files,
            files_last_7_days,
            "Detailed stats computed"
        );
        Ok(stats)
    }
}

fn summarize(tenant_id: Option<&str>, by_type: &[GroupStats]) -> TenantStats {
    let mut stats = TenantStats::empty(tenant_id);

    for group in by_type {
        let media_type = group
            .key
            .as_deref()
            .map(MediaType::parse_lossy)
            .unwrap_or_default();
        *stats.file_type_counts.entry(media_type).or_insert(0) += group.count;
        stats.total_files += group.count;
        stats.total_size_bytes = stats.total_size_bytes.saturating_add(group.total_size_bytes);
        stats.last_indexed = stats.last_indexed.max(group.last_indexed);
    }

    stats
}

fn quality_breakdown(by_quality: &[GroupStats]) -> BTreeMap<String, u64> {
    by_quality
        .iter()
        .filter_map(|group| {
            let quality = group.key.as_deref()?;
            (!quality.eq_ignore_ascii_case("unknown")).then(|| (quality.to_string(), group.count))
        })
        .collect()
}

fn top_sources(by_source: &[GroupStats]) -> Vec<SourceCount> {
    let mut sources: Vec<SourceCount> = by_source
        .iter()
        .filter_map(|group| {
            group.key.as_ref().map(|source| SourceCount {
                source: source.clone(),
                files: group.count,
            })
        })
        .collect();

    sources.sort_by(|a, b| b.files.cmp(&a.files).then_with(|| a.source.cmp(&b.source)));
    sources.truncate(TOP_SOURCES);
    sources
}

fn most_active_day(by_day: &[GroupStats]) -> Option<DayCount> {
    by_day
        .iter()
        .filter_map(|group| {
            group.day().map(|day| DayCount {
                day,
                files: group.count,
            })
        })
        .max_by(|a, b| a.files.cmp(&b.files).then_with(|| a.day.cmp(&b.day)))
}
