//! Filter, sort and aggregation primitives shared by every store backend.

use crate::models::{CounterField, FileRecord, MediaType};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Which partition a query targets
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TenantScope {
    /// The unscoped partition (`tenant_id == None`)
    #[default]
    Global,
    Tenant(String),
}

impl TenantScope {
    pub fn from_tenant(tenant_id: Option<&str>) -> Self {
        match tenant_id {
            Some(tenant) => TenantScope::Tenant(tenant.to_string()),
            None => TenantScope::Global,
        }
    }

    pub fn tenant_id(&self) -> Option<&str> {
        match self {
            TenantScope::Global => None,
            TenantScope::Tenant(tenant) => Some(tenant.as_str()),
        }
    }

    /// Strict partition equality: a tenant never sees the global partition and vice versa
    pub fn contains(&self, record: &FileRecord) -> bool {
        self.tenant_id() == record.tenant_id.as_deref()
    }
}

/// Filter for querying records. Every query is bound to exactly one partition.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub scope: TenantScope,

    /// Allowed media types; empty means any
    pub media_types: Vec<MediaType>,

    /// Lowercase tokens; a record matches when ANY token is a substring of
    /// its name, caption or one of its keywords. Empty means no text constraint.
    pub any_text: Vec<String>,

    /// Only records indexed at or after this instant
    pub indexed_since: Option<DateTime<Utc>>,
}

impl RecordFilter {
    pub fn for_tenant(tenant_id: Option<&str>) -> Self {
        Self {
            scope: TenantScope::from_tenant(tenant_id),
            ..Default::default()
        }
    }

    pub fn with_media_types(mut self, media_types: Vec<MediaType>) -> Self {
        self.media_types = media_types;
        self
    }

    /// Restrict to discovery-eligible types
    pub fn eligible_only(self) -> Self {
        self.with_media_types(MediaType::eligible())
    }

    pub fn with_any_text(mut self, tokens: Vec<String>) -> Self {
        self.any_text = tokens;
        self
    }

    pub fn indexed_since(mut self, since: DateTime<Utc>) -> Self {
        self.indexed_since = Some(since);
        self
    }

    pub fn matches(&self, record: &FileRecord) -> bool {
        if !self.scope.contains(record) {
            return false;
        }

        if !self.media_types.is_empty() && !self.media_types.contains(&record.media_type) {
            return false;
        }

        if let Some(since) = self.indexed_since {
            if record.indexed_at < since {
                return false;
            }
        }

        self.any_text.is_empty() || self.matches_text(record)
    }

    fn matches_text(&self, record: &FileRecord) -> bool {
        let name = record.name.to_lowercase();
        let caption = record
            .caption
            .as_deref()
            .map(str::to_lowercase)
            .unwrap_or_default();

        self.any_text.iter().any(|token| {
            name.contains(token.as_str())
                || caption.contains(token.as_str())
                || record
                    .keywords
                    .iter()
                    .any(|keyword| keyword.to_lowercase().contains(token.as_str()))
        })
    }
}

/// Result ordering for scans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordSort {
    /// Store insertion order
    #[default]
    Insertion,
    /// Newest `indexed_at` first, ties in insertion order
    IndexedAtDesc,
}

impl RecordSort {
    pub fn compare(&self, a: &FileRecord, b: &FileRecord) -> Ordering {
        match self {
            RecordSort::Insertion => a.sequence.cmp(&b.sequence),
            RecordSort::IndexedAtDesc => b
                .indexed_at
                .cmp(&a.indexed_at)
                .then_with(|| a.sequence.cmp(&b.sequence)),
        }
    }

    pub fn apply(&self, records: &mut [FileRecord]) {
        records.sort_by(|a, b| self.compare(a, b));
    }
}

/// How `upsert` treats an existing record under the same key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReindexPolicy {
    /// Keep counters, last access and insertion sequence of the existing record
    #[default]
    PreserveCounters,
    /// Replace every field, resetting counters to zero
    ReplaceAll,
}

/// Atomic counter increments plus an optional `last_accessed` touch,
/// applied to every key of a batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CounterBump {
    pub increments: Vec<(CounterField, u64)>,
    pub touched_at: Option<DateTime<Utc>>,
}

impl CounterBump {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(mut self, field: CounterField, by: u64) -> Self {
        self.increments.push((field, by));
        self
    }

    pub fn touch(mut self, at: DateTime<Utc>) -> Self {
        self.touched_at = Some(at);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.increments.is_empty() && self.touched_at.is_none()
    }

    /// Apply to an in-hand record. Backends call this inside their atomic
    /// per-record update, never as a separate read and write.
    pub fn apply(&self, record: &mut FileRecord) {
        for (field, by) in &self.increments {
            record.increment(*field, *by);
        }
        if let Some(at) = self.touched_at {
            record.last_accessed = Some(match record.last_accessed {
                Some(previous) if previous > at => previous,
                _ => at,
            });
        }
    }
}

/// Grouping key for aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    /// Single group covering the whole filtered set
    None,
    MediaType,
    Quality,
    Source,
    IndexedDay,
}

impl GroupBy {
    fn key_of(&self, record: &FileRecord) -> Option<String> {
        match self {
            GroupBy::None => None,
            GroupBy::MediaType => Some(record.media_type.to_string()),
            GroupBy::Quality => record.quality.clone(),
            GroupBy::Source => record.source_ref.as_ref().map(|s| s.channel.clone()),
            GroupBy::IndexedDay => Some(record.indexed_at.date_naive().to_string()),
        }
    }
}

/// One aggregated group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    /// `None` for the whole set or for records missing the grouped field
    pub key: Option<String>,
    pub count: u64,
    pub total_size_bytes: u64,
    pub last_indexed: Option<DateTime<Utc>>,
}

impl GroupStats {
    fn empty(key: Option<String>) -> Self {
        Self {
            key,
            count: 0,
            total_size_bytes: 0,
            last_indexed: None,
        }
    }

    fn add(&mut self, record: &FileRecord) {
        self.count += 1;
        self.total_size_bytes = self.total_size_bytes.saturating_add(record.size_bytes);
        self.last_indexed = Some(match self.last_indexed {
            Some(current) if current >= record.indexed_at => current,
            _ => record.indexed_at,
        });
    }

    /// Day of an `IndexedDay` group
    pub fn day(&self) -> Option<NaiveDate> {
        self.key.as_deref().and_then(|k| k.parse().ok())
    }
}

/// Group/count/sum/max over already-filtered records, ordered by key.
/// `GroupBy::None` yields exactly one group, even for empty input.
pub fn aggregate_records<'a, I>(records: I, group_by: GroupBy) -> Vec<GroupStats>
where
    I: IntoIterator<Item = &'a FileRecord>,
{
    let mut groups: HashMap<Option<String>, GroupStats> = HashMap::new();
    if group_by == GroupBy::None {
        groups.insert(None, GroupStats::empty(None));
    }

    for record in records {
        let key = group_by.key_of(record);
        groups
            .entry(key.clone())
            .or_insert_with(|| GroupStats::empty(key))
            .add(record);
    }

    let mut out: Vec<GroupStats> = groups.into_values().collect();
    out.sort_by(|a, b| a.key.cmp(&b.key));
    out
}
