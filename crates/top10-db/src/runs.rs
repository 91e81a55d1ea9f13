//! Read-side queries for `ranking_runs` and `weekly_rankings`.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use top10_core::{RankingEntry, RankingKey};
use uuid::Uuid;

use crate::DbError;

/// A row from the `ranking_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RunRow {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub status: String,
    pub source_used: String,
    pub documents_saved: i64,
    pub errors: Vec<String>,
}

/// A row from the `weekly_rankings` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredRankingRow {
    pub period: NaiveDate,
    pub country: String,
    pub country_name: String,
    pub category: String,
    pub source: String,
    pub fetched_at: DateTime<Utc>,
    pub entries: Json<Vec<RankingEntry>>,
    pub updated_at: DateTime<Utc>,
}

/// Returns the most recent runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_runs(pool: &PgPool, limit: i64) -> Result<Vec<RunRow>, DbError> {
    let rows = sqlx::query_as::<_, RunRow>(
        "SELECT run_id, started_at, completed_at, status, source_used, documents_saved, errors \
         FROM ranking_runs \
         ORDER BY started_at DESC, id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetches the stored ranking for `key`, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_ranking(
    pool: &PgPool,
    key: &RankingKey,
) -> Result<Option<StoredRankingRow>, DbError> {
    let row = sqlx::query_as::<_, StoredRankingRow>(
        "SELECT period, country, country_name, category, source, \
                fetched_at, entries, updated_at \
         FROM weekly_rankings \
         WHERE period = $1 AND country = $2 AND category = $3",
    )
    .bind(key.period)
    .bind(&key.country)
    .bind(key.category.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
