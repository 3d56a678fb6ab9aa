//! Best-effort normalization of upstream file metadata.
//!
//! Nothing here fails: malformed fields collapse to type-appropriate
//! defaults, and the [`Indexer`](crate::indexing::Indexer) decides whether
//! what is left is usable.

use crate::config::IndexingConfig;
use crate::models::{MediaType, SourceRef};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

static QUALITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(2160p|4k|1440p|1080p|720p|480p|360p|hdrip|webrip|web-dl|bluray|brrip|dvdrip|hdtv|hdcam|cam)\b")
        .expect("quality regex is valid")
});

/// File metadata as received from upstream, every field optional and loosely typed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMetadata {
    /// String or number
    #[serde(default, alias = "id", alias = "file_id")]
    pub record_id: Option<Value>,

    #[serde(default, alias = "file_name")]
    pub name: Option<String>,

    #[serde(default)]
    pub caption: Option<String>,

    #[serde(default, alias = "type", alias = "file_type")]
    pub media_type: Option<String>,

    /// Number or numeric string
    #[serde(default, alias = "size", alias = "file_size")]
    pub size_bytes: Option<Value>,

    /// Number or numeric string
    #[serde(default, alias = "user_id")]
    pub owner_id: Option<Value>,

    #[serde(default, alias = "channel_id")]
    pub source_channel: Option<Value>,

    #[serde(default, alias = "message_id")]
    pub source_message_id: Option<Value>,

    #[serde(default)]
    pub quality: Option<String>,
}

/// Metadata after sanitization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanitizedInput {
    pub record_id: String,
    pub tenant_id: Option<String>,
    pub name: String,
    pub caption: Option<String>,
    pub media_type: MediaType,
    pub size_bytes: u64,
    pub owner_id: Option<i64>,
    pub source_ref: Option<SourceRef>,
    pub quality: Option<String>,
}

/// Applies configured length bounds and defaults
#[derive(Debug, Clone)]
pub struct Sanitizer {
    limits: IndexingConfig,
}

impl Sanitizer {
    pub fn new(limits: IndexingConfig) -> Self {
        Self { limits }
    }

    /// Normalize raw metadata for the given (raw) tenant
    pub fn normalize(&self, raw: &RawMetadata, raw_tenant: Option<&str>) -> SanitizedInput {
        let record_id = self.record_id(
            &raw.record_id
                .as_ref()
                .and_then(value_to_string)
                .unwrap_or_default(),
        );
        let name = clean_text(raw.name.as_deref().unwrap_or_default(), self.limits.max_name_len);
        let caption = non_empty(clean_text(
            raw.caption.as_deref().unwrap_or_default(),
            self.limits.max_caption_len,
        ));
        let media_type = MediaType::parse_lossy(&clean_text(
            raw.media_type.as_deref().unwrap_or_default(),
            self.limits.max_type_len,
        ));

        let source_ref = self
            .explicit_source(raw)
            .or_else(|| SourceRef::from_record_id(&record_id));

        let quality = raw
            .quality
            .as_deref()
            .map(|q| clean_text(q, self.limits.max_quality_len).to_lowercase())
            .filter(|q| !q.is_empty() && q != "unknown")
            .or_else(|| detect_quality(&name));

        SanitizedInput {
            record_id,
            tenant_id: self.tenant(raw_tenant),
            name,
            caption,
            media_type,
            size_bytes: parse_u64(raw.size_bytes.as_ref()).unwrap_or(0),
            owner_id: parse_i64(raw.owner_id.as_ref()),
            source_ref,
            quality,
        }
    }

    /// Sanitized tenant; blank collapses to the global partition
    pub fn tenant(&self, raw_tenant: Option<&str>) -> Option<String> {
        raw_tenant
            .map(|t| clean_text(t, self.limits.max_tenant_len))
            .and_then(non_empty)
    }

    /// Sanitized record id (may be empty)
    pub fn record_id(&self, raw_id: &str) -> String {
        clean_text(raw_id, self.limits.max_id_len)
    }

    fn explicit_source(&self, raw: &RawMetadata) -> Option<SourceRef> {
        let channel = raw
            .source_channel
            .as_ref()
            .and_then(value_to_string)
            .map(|c| clean_text(&c, self.limits.max_id_len))
            .and_then(non_empty)?;

        Some(SourceRef {
            channel,
            message_id: parse_i64(raw.source_message_id.as_ref()),
        })
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(IndexingConfig::default())
    }
}

/// Strip control characters, trim, and truncate to `max_chars` characters
pub fn clean_text(raw: &str, max_chars: usize) -> String {
    let stripped: String = raw.chars().filter(|c| !c.is_control()).collect();
    stripped.trim().chars().take(max_chars).collect::<String>().trim_end().to_string()
}

/// Quality tag found in a file name, lowercased
pub fn detect_quality(name: &str) -> Option<String> {
    QUALITY_RE
        .find(name)
        .map(|m| m.as_str().to_lowercase())
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Non-negative integer from a number or numeric string; negatives clamp to 0
fn parse_u64(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_i64().map(|v| v.max(0) as u64))
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.max(0.0) as u64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<i64>().ok().map(|v| v.max(0) as u64))
        }
        _ => None,
    }
}

fn parse_i64(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
