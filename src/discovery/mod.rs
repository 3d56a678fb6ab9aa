//! Browsing without a query: random, recent and popular.
//!
//! All three modes only consider records of an eligible media type
//! (anything but `unknown`) in the caller's partition.
//!
//! Random mode runs an ordered [`RandomChain`]; with the default chain it
//! first samples `2 × limit` candidates in the store and ranks them by
//! [`quality_score`], and if that fails it scans `2 × limit` records in
//! default order and picks uniformly. Popular mode ranks by
//! [`popularity_score`] and falls back to recent mode until something has
//! been downloaded.

mod engine;
mod scoring;
mod strategy;

pub use engine::{validate_candidate, DiscoveryEngine};
pub use scoring::{
    popularity_score, quality_score, rank_by_popularity, rank_by_quality, size_score,
    LARGE_FILE_BYTES, MEDIUM_FILE_BYTES,
};
pub use strategy::RandomChain;
