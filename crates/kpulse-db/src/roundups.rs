//! Database operations for the `weekly_roundups` table.

use chrono::{DateTime, NaiveDate, Utc};
use kpulse_core::{NewWeeklyRoundup, RoundupArticle};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A group-tagged article with its translation, input to a weekly roundup.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RoundupArticleRow {
    pub id: Uuid,
    pub original_title: String,
    pub translated_title: Option<String>,
    pub translated_summary: Option<String>,
    pub published_at: DateTime<Utc>,
}

impl From<RoundupArticleRow> for RoundupArticle {
    fn from(row: RoundupArticleRow) -> Self {
        Self {
            id: row.id,
            original_title: row.original_title,
            translated_title: row.translated_title,
            translated_summary: row.translated_summary,
            published_at: row.published_at,
        }
    }
}

/// Ids of groups that already have a roundup starting on `week_start`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_roundup_group_ids_for_week(
    pool: &PgPool,
    week_start: NaiveDate,
) -> Result<Vec<Uuid>, DbError> {
    let ids = sqlx::query_scalar::<_, Uuid>(
        "SELECT group_id FROM weekly_roundups WHERE week_start = $1",
    )
    .bind(week_start)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

/// Articles tagged with `group_id`, published within `[start, end]`, that have
/// a translation in `language`. Most recent first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_group_articles_in_range(
    pool: &PgPool,
    group_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    language: &str,
) -> Result<Vec<RoundupArticleRow>, DbError> {
    let rows = sqlx::query_as::<_, RoundupArticleRow>(
        "SELECT a.id, a.original_title, t.translated_title, t.translated_summary, a.published_at \
         FROM article_groups ag \
         JOIN articles a ON a.id = ag.article_id \
         JOIN translations t ON t.article_id = a.id AND t.language = $4 \
         WHERE ag.group_id = $1 \
           AND a.published_at >= $2 \
           AND a.published_at <= $3 \
         ORDER BY a.published_at DESC",
    )
    .bind(group_id)
    .bind(start)
    .bind(end)
    .bind(language)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Upsert a weekly roundup keyed on `(group_id, week_start)`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails.
pub async fn upsert_weekly_roundup(pool: &PgPool, roundup: &NewWeeklyRoundup) -> Result<Uuid, DbError> {
    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO weekly_roundups \
             (group_id, week_start, week_end, title, summary, highlights, \
              article_count, article_ids) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (group_id, week_start) DO UPDATE SET \
             week_end      = EXCLUDED.week_end, \
             title         = EXCLUDED.title, \
             summary       = EXCLUDED.summary, \
             highlights    = EXCLUDED.highlights, \
             article_count = EXCLUDED.article_count, \
             article_ids   = EXCLUDED.article_ids, \
             updated_at    = NOW() \
         RETURNING id",
    )
    .bind(roundup.group_id)
    .bind(roundup.week_start)
    .bind(roundup.week_end)
    .bind(&roundup.title)
    .bind(&roundup.summary)
    .bind(&roundup.highlights)
    .bind(roundup.article_count)
    .bind(&roundup.article_ids)
    .fetch_one(pool)
    .await?;
    Ok(id)
}
