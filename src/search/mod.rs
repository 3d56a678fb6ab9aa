//! Keyword search and access tracking.
//!
//! Queries are split with the same word tokenizer used at indexing time,
//! but without the length and stop word filters. A record matches when any
//! token occurs (case-insensitively) in its name, caption or keywords.
//! Every returned record gets `access_count + 1` and a fresh
//! `last_accessed`, issued as one best-effort batch that never affects the
//! returned results.

mod engine;
mod tracking;

pub use engine::SearchEngine;
pub use tracking::UsageTracker;
