//! Idempotent ranking sink and run-audit writer.

use std::future::Future;

use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use top10_core::{collapse_duplicate_keys, CategoryRanking, RunRecord};

use crate::DbError;

/// Destination for validated rankings and run records.
///
/// `save` must be an upsert keyed by `(period, country, category)`: saving
/// the same rankings twice leaves one row per key, never two.
pub trait RankingStore {
    /// Upserts every ranking as one batch and returns the number of keys
    /// written. An empty batch is a no-op returning `0`.
    fn save(&self, rankings: &[CategoryRanking])
        -> impl Future<Output = Result<u64, DbError>> + Send;

    /// Appends one run-audit record.
    fn record_run(&self, run: &RunRecord) -> impl Future<Output = Result<(), DbError>> + Send;
}

/// Postgres-backed [`RankingStore`].
#[derive(Debug, Clone)]
pub struct PgRankingStore {
    pool: PgPool,
}

impl PgRankingStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl RankingStore for PgRankingStore {
    async fn save(&self, rankings: &[CategoryRanking]) -> Result<u64, DbError> {
        // Postgres rejects an ON CONFLICT batch that touches the same key twice.
        let rankings = collapse_duplicate_keys(rankings.to_vec());
        if rankings.is_empty() {
            return Ok(0);
        }

        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "INSERT INTO weekly_rankings \
             (period, country, country_name, category, source, fetched_at, entries) ",
        );
        qb.push_values(&rankings, |mut b, r| {
            b.push_bind(r.period())
                .push_bind(r.country())
                .push_bind(r.country_name())
                .push_bind(r.category().as_str())
                .push_bind(r.source().as_str())
                .push_bind(r.fetched_at())
                .push_bind(Json(r.entries()));
        });
        qb.push(
            " ON CONFLICT (period, country, category) DO UPDATE SET \
               country_name = EXCLUDED.country_name, \
               source = EXCLUDED.source, \
               fetched_at = EXCLUDED.fetched_at, \
               entries = EXCLUDED.entries, \
               updated_at = NOW()",
        );

        let result = qb.build().execute(&self.pool).await?;
        tracing::debug!(
            rows = result.rows_affected(),
            batch = rankings.len(),
            "rankings upserted"
        );
        Ok(result.rows_affected())
    }

    async fn record_run(&self, run: &RunRecord) -> Result<(), DbError> {
        let documents_saved =
            i64::try_from(run.documents_saved).map_err(|_| DbError::OutOfRange {
                column: "documents_saved",
                value: run.documents_saved,
            })?;

        sqlx::query(
            "INSERT INTO ranking_runs \
             (run_id, started_at, completed_at, status, source_used, documents_saved, errors) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (run_id) DO NOTHING",
        )
        .bind(run.run_id)
        .bind(run.started_at)
        .bind(run.completed_at)
        .bind(run.status.as_str())
        .bind(run.source_label())
        .bind(documents_saved)
        .bind(&run.errors)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
