use crate::models::MediaType;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of sources reported in [`DetailedTenantStats::top_sources`]
pub const TOP_SOURCES: usize = 5;

/// Summary statistics for one partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantStats {
    pub tenant_id: Option<String>,
    pub total_files: u64,
    pub total_size_bytes: u64,
    pub file_type_counts: BTreeMap<MediaType, u64>,
    /// `None` means the partition was never indexed
    pub last_indexed: Option<DateTime<Utc>>,
}

impl TenantStats {
    /// Zeroed stats with the "never indexed" sentinel
    pub fn empty(tenant_id: Option<&str>) -> Self {
        Self {
            tenant_id: tenant_id.map(str::to_string),
            total_files: 0,
            total_size_bytes: 0,
            file_type_counts: BTreeMap::new(),
            last_indexed: None,
        }
    }

    pub fn never_indexed(&self) -> bool {
        self.last_indexed.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCount {
    pub source: String,
    pub files: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCount {
    pub day: NaiveDate,
    pub files: u64,
}

/// Summary plus quality, source and activity breakdowns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedTenantStats {
    pub summary: TenantStats,
    /// Files per quality tag; untagged and `unknown` are left out
    pub quality_breakdown: BTreeMap<String, u64>,
    /// Most frequent sources, file count descending then source ascending
    pub top_sources: Vec<SourceCount>,
    /// Day with the most ingestions; the latest such day on ties
    pub most_active_day: Option<DayCount>,
    pub files_last_7_days: u64,
}

impl DetailedTenantStats {
    pub fn empty(tenant_id: Option<&str>) -> Self {
        Self {
            summary: TenantStats::empty(tenant_id),
            quality_breakdown: BTreeMap::new(),
            top_sources: Vec::new(),
            most_active_day: None,
            files_last_7_days: 0,
        }
    }
}
