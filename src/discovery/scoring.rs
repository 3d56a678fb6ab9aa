//! Ranking heuristics. Scores only order results and are never stored.

use crate::models::FileRecord;
use std::cmp::Ordering;

const MIB: u64 = 1024 * 1024;

/// Files at or above this size get the top size score
pub const LARGE_FILE_BYTES: u64 = 50 * MIB;

/// Files at or above this size get the middle size score
pub const MEDIUM_FILE_BYTES: u64 = 10 * MIB;

pub fn size_score(size_bytes: u64) -> f64 {
    if size_bytes >= LARGE_FILE_BYTES {
        5.0
    } else if size_bytes >= MEDIUM_FILE_BYTES {
        3.0
    } else {
        1.0
    }
}

/// `size_score + 0.1 × access_count + type_bonus`
pub fn quality_score(record: &FileRecord) -> f64 {
    size_score(record.size_bytes) + 0.1 * record.access_count as f64 + record.media_type.type_bonus()
}

/// `5 × downloads + views + 3 × shares`
pub fn popularity_score(record: &FileRecord) -> u64 {
    record
        .download_count
        .saturating_mul(5)
        .saturating_add(record.view_count)
        .saturating_add(record.share_count.saturating_mul(3))
}

/// Highest quality first; stable for equal scores
pub fn rank_by_quality(records: &mut [FileRecord]) {
    records.sort_by(|a, b| quality_score(b).total_cmp(&quality_score(a)));
}

/// Highest popularity first, then most downloads, then newest
pub fn rank_by_popularity(records: &mut [FileRecord]) {
    records.sort_by(|a, b| compare_popularity(a, b));
}

fn compare_popularity(a: &FileRecord, b: &FileRecord) -> Ordering {
    popularity_score(b)
        .cmp(&popularity_score(a))
        .then_with(|| b.download_count.cmp(&a.download_count))
        .then_with(|| b.indexed_at.cmp(&a.indexed_at))
        .then_with(|| a.sequence.cmp(&b.sequence))
}
