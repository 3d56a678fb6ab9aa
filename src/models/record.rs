use crate::models::MediaType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumString};
use validator::Validate;

/// Upper bound enforced on every stored record id, independent of sanitizer settings
pub const MAX_RECORD_ID_LEN: usize = 256;

/// A single indexed file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct FileRecord {
    /// Identifier, unique within its tenant partition
    #[validate(length(min = 1, max = 256))]
    pub record_id: String,

    /// Owning tenant; `None` is the global partition
    pub tenant_id: Option<String>,

    /// Sanitized display name
    pub name: String,

    /// Sanitized caption
    pub caption: Option<String>,

    pub media_type: MediaType,

    pub size_bytes: u64,

    /// Lowercase tokens derived from name and caption at indexing time
    pub keywords: Vec<String>,

    /// Uploader
    pub owner_id: Option<i64>,

    /// Origin channel/message used to reconstruct delivery
    pub source_ref: Option<SourceRef>,

    /// Release quality tag such as `1080p`
    pub quality: Option<String>,

    pub access_count: u64,
    pub download_count: u64,
    pub view_count: u64,
    pub share_count: u64,
    pub like_count: u64,

    /// Set on creation and every reindex
    pub indexed_at: DateTime<Utc>,

    /// Updated by search, discovery and download tracking
    pub last_accessed: Option<DateTime<Utc>>,

    /// Store-assigned insertion sequence, kept across reindex
    #[serde(default)]
    pub sequence: u64,
}

impl FileRecord {
    /// Partition-scoped key of this record
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.tenant_id.clone(), self.record_id.clone())
    }

    /// Add to a usage counter. Saturates instead of wrapping.
    pub fn increment(&mut self, field: CounterField, by: u64) {
        let slot = match field {
            CounterField::Access => &mut self.access_count,
            CounterField::Download => &mut self.download_count,
            CounterField::View => &mut self.view_count,
            CounterField::Share => &mut self.share_count,
            CounterField::Like => &mut self.like_count,
        };
        *slot = slot.saturating_add(by);
    }

    /// Copy usage state (counters, last access, sequence) from a previous version
    pub fn inherit_usage(&mut self, previous: &FileRecord) {
        self.access_count = previous.access_count;
        self.download_count = previous.download_count;
        self.view_count = previous.view_count;
        self.share_count = previous.share_count;
        self.like_count = previous.like_count;
        self.last_accessed = previous.last_accessed;
        self.sequence = previous.sequence;
    }
}

/// Usage counters carried on every record
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CounterField {
    Access,
    Download,
    View,
    Share,
    Like,
}

/// Where a file was originally posted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SourceRef {
    /// Origin channel
    pub channel: String,

    /// Message within the channel, when known
    pub message_id: Option<i64>,
}

impl SourceRef {
    /// Derive the origin from a composite `{source}_{sequence}` id
    pub fn from_record_id(record_id: &str) -> Option<Self> {
        match RecordIdShape::classify(record_id)? {
            RecordIdShape::Composite { source, sequence } => Some(Self {
                channel: source.to_string(),
                message_id: sequence.parse().ok(),
            }),
            RecordIdShape::Numeric => None,
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message_id {
            Some(message_id) => write!(f, "{}/{}", self.channel, message_id),
            None => write!(f, "{}", self.channel),
        }
    }
}

/// The two accepted record id shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordIdShape<'a> {
    /// Digits only, e.g. `12345`
    Numeric,
    /// `{source}_{sequence}` with a numeric sequence, e.g. `-1001_42`
    Composite { source: &'a str, sequence: &'a str },
}

impl<'a> RecordIdShape<'a> {
    /// Classify an id, returning `None` when it matches neither shape
    pub fn classify(record_id: &'a str) -> Option<Self> {
        if record_id.is_empty() || record_id.len() > MAX_RECORD_ID_LEN {
            return None;
        }

        if is_digits(record_id) {
            return Some(RecordIdShape::Numeric);
        }

        let (source, sequence) = record_id.rsplit_once('_')?;
        if source.is_empty() || source.chars().any(char::is_whitespace) || !is_digits(sequence) {
            return None;
        }

        Some(RecordIdShape::Composite { source, sequence })
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Whether an id has one of the accepted shapes
pub fn is_valid_record_id(record_id: &str) -> bool {
    RecordIdShape::classify(record_id).is_some()
}

/// Partition-scoped record key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub tenant_id: Option<String>,
    pub record_id: String,
}

impl RecordKey {
    pub fn new(tenant_id: Option<String>, record_id: impl Into<String>) -> Self {
        Self {
            tenant_id,
            record_id: record_id.into(),
        }
    }

    /// Byte prefix shared by every key of a partition.
    ///
    /// Sanitized tenant ids never contain NUL, so it can terminate the tenant part.
    pub fn partition_prefix(tenant_id: Option<&str>) -> Vec<u8> {
        let mut prefix = Vec::with_capacity(2 + tenant_id.map_or(0, str::len));
        match tenant_id {
            Some(tenant) => {
                prefix.push(b't');
                prefix.extend_from_slice(tenant.as_bytes());
            }
            None => prefix.push(b'g'),
        }
        prefix.push(0);
        prefix
    }

    /// Ordered byte encoding used by persistent backends
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Self::partition_prefix(self.tenant_id.as_deref());
        bytes.extend_from_slice(self.record_id.as_bytes());
        bytes
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tenant_id {
            Some(tenant) => write!(f, "{}:{}", tenant, self.record_id),
            None => write!(f, "<global>:{}", self.record_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_shapes() {
        assert_eq!(RecordIdShape::classify("12345"), Some(RecordIdShape::Numeric));
        assert_eq!(
            RecordIdShape::classify("100_5"),
            Some(RecordIdShape::Composite {
                source: "100",
                sequence: "5"
            })
        );
        assert_eq!(
            RecordIdShape::classify("-1001234_77"),
            Some(RecordIdShape::Composite {
                source: "-1001234",
                sequence: "77"
            })
        );
        assert!(RecordIdShape::classify("").is_none());
        assert!(RecordIdShape::classify("abc").is_none());
        assert!(RecordIdShape::classify("100_").is_none());
        assert!(RecordIdShape::classify("_5").is_none());
        assert!(RecordIdShape::classify("100_5a").is_none());
        assert!(RecordIdShape::classify("my file_5").is_none());
    }

    #[test]
    fn test_source_ref_from_composite_id() {
        let source = SourceRef::from_record_id("chan_42").unwrap();
        assert_eq!(source.channel, "chan");
        assert_eq!(source.message_id, Some(42));
        assert_eq!(source.to_string(), "chan/42");

        assert!(SourceRef::from_record_id("42").is_none());
    }

    #[test]
    fn test_partition_prefixes_do_not_collide() {
        let global = RecordKey::new(None, "1").to_bytes();
        let tenant = RecordKey::new(Some("A".to_string()), "1").to_bytes();
        let other = RecordKey::new(Some("AB".to_string()), "1").to_bytes();

        assert_ne!(global, tenant);
        assert!(tenant.starts_with(&RecordKey::partition_prefix(Some("A"))));
        assert!(!other.starts_with(&RecordKey::partition_prefix(Some("A"))));
        assert!(!global.starts_with(&RecordKey::partition_prefix(Some("A"))));
    }
}
