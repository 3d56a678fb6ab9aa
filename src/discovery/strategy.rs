//! Random-mode retrieval strategies and their ordered fallback chain.

use crate::config::RandomStrategyKind;
use crate::discovery::scoring::rank_by_quality;
use crate::error::Result;
use crate::models::FileRecord;
use crate::state::{FileStore, RecordFilter, RecordSort};
use rand::seq::IndexedRandom;

impl RandomStrategyKind {
    /// Draw ordered candidates for `limit` results.
    ///
    /// The caller validates and truncates; strategies only decide which
    /// records are considered and in what order.
    pub async fn draw(
        &self,
        store: &dyn FileStore,
        filter: &RecordFilter,
        limit: usize,
        oversample_factor: usize,
    ) -> Result<Vec<FileRecord>> {
        let pool_size = limit.saturating_mul(oversample_factor);

        match self {
            RandomStrategyKind::WeightedSample => {
                let mut candidates = store.sample(filter, pool_size).await?;
                rank_by_quality(&mut candidates);
                Ok(candidates)
            }
            RandomStrategyKind::UniformScan => {
                let fetched = store
                    .scan(filter, RecordSort::Insertion, Some(pool_size))
                    .await?;
                Ok(uniform_pick(&fetched, limit))
            }
        }
    }
}

fn uniform_pick(records: &[FileRecord], count: usize) -> Vec<FileRecord> {
    let mut rng = rand::rng();
    records.choose_multiple(&mut rng, count).cloned().collect()
}

/// Strategies tried in order until one succeeds
#[derive(Debug, Clone)]
pub struct RandomChain {
    strategies: Vec<RandomStrategyKind>,
}

impl RandomChain {
    pub fn new(strategies: Vec<RandomStrategyKind>) -> Self {
        Self { strategies }
    }

    /// Result of the first strategy that succeeds, or `None` when all fail
    pub async fn run(
        &self,
        store: &dyn FileStore,
        filter: &RecordFilter,
        limit: usize,
        oversample_factor: usize,
    ) -> Option<Vec<FileRecord>> {
        for (attempt, strategy) in self.strategies.iter().enumerate() {
            match strategy.draw(store, filter, limit, oversample_factor).await {
                Ok(candidates) => {
                    if attempt > 0 {
                        tracing::info!(strategy = ?strategy, attempt, "Random discovery served by fallback");
                    }
                    return Some(candidates);
                }
                Err(e) => {
                    tracing::warn!(
                        strategy = ?strategy,
                        error = %e,
                        "Random discovery strategy failed"
                    );
                }
            }
        }

        None
    }
}
