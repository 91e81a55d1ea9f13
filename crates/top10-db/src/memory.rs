//! In-process [`RankingStore`] used for dry runs and pipeline tests.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use top10_core::{collapse_duplicate_keys, CategoryRanking, RankingKey, RunRecord};

use crate::store::RankingStore;
use crate::DbError;

/// Keeps rankings in a map keyed exactly like the `weekly_rankings` unique
/// constraint, so upsert behaviour matches the Postgres store.
#[derive(Debug, Default)]
pub struct MemoryRankingStore {
    rankings: Mutex<BTreeMap<RankingKey, CategoryRanking>>,
    runs: Mutex<Vec<RunRecord>>,
}

impl MemoryRankingStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of stored rankings, ordered by key.
    #[must_use]
    pub fn rankings(&self) -> Vec<CategoryRanking> {
        self.rankings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn get(&self, key: &RankingKey) -> Option<CategoryRanking> {
        self.rankings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Run records in the order they were written.
    #[must_use]
    pub fn runs(&self) -> Vec<RunRecord> {
        self.runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RankingStore for MemoryRankingStore {
    async fn save(&self, rankings: &[CategoryRanking]) -> Result<u64, DbError> {
        let rankings = collapse_duplicate_keys(rankings.to_vec());
        let written = u64::try_from(rankings.len()).unwrap_or(u64::MAX);
        let mut stored = self.rankings.lock().unwrap_or_else(PoisonError::into_inner);
        for ranking in rankings {
            stored.insert(ranking.key(), ranking);
        }
        Ok(written)
    }

    async fn record_run(&self, run: &RunRecord) -> Result<(), DbError> {
        let mut runs = self.runs.lock().unwrap_or_else(PoisonError::into_inner);
        if !runs.iter().any(|r| r.run_id == run.run_id) {
            runs.push(run.clone());
        }
        Ok(())
    }
}
