//! Aggregate counts for the pipeline status endpoint.

use chrono::{DateTime, Utc};
use kpulse_core::{PipelineStatus, RecentArticle};
use sqlx::PgPool;

use crate::DbError;

const RECENT_ARTICLE_LIMIT: i64 = 5;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecentArticleRow {
    pub original_title: String,
    pub published_at: DateTime<Utc>,
    pub is_translated: bool,
}

impl From<RecentArticleRow> for RecentArticle {
    fn from(row: RecentArticleRow) -> Self {
        Self {
            original_title: row.original_title,
            published_at: row.published_at,
            is_translated: row.is_translated,
        }
    }
}

/// Article and source counts plus the most recently collected articles.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any query fails.
pub async fn pipeline_status(pool: &PgPool) -> Result<PipelineStatus, DbError> {
    let (total_articles, translated_articles): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE is_translated) FROM articles",
    )
    .fetch_one(pool)
    .await?;

    let total_sources: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sources")
        .fetch_one(pool)
        .await?;

    let recent = sqlx::query_as::<_, RecentArticleRow>(
        "SELECT original_title, published_at, is_translated \
         FROM articles \
         ORDER BY collected_at DESC \
         LIMIT $1",
    )
    .bind(RECENT_ARTICLE_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(PipelineStatus {
        total_articles,
        translated_articles,
        untranslated_articles: total_articles - translated_articles,
        total_sources,
        recent_articles: recent.into_iter().map(RecentArticle::from).collect(),
    })
}
