//! Database operations for the `articles` table.

use chrono::{DateTime, Utc};
use kpulse_core::{NewArticle, Topic, UntranslatedArticle};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// An article still waiting for translation.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UntranslatedArticleRow {
    pub id: Uuid,
    pub original_title: String,
    pub original_content: Option<String>,
    pub published_at: DateTime<Utc>,
}

impl From<UntranslatedArticleRow> for UntranslatedArticle {
    fn from(row: UntranslatedArticleRow) -> Self {
        Self {
            id: row.id,
            original_title: row.original_title,
            original_content: row.original_content,
        }
    }
}

/// Upsert a batch of articles keyed on `original_url`.
///
/// Returns `(new_count, updated_count)`. Existing rows get their title,
/// content, source, and publication time refreshed; translation and tagging
/// flags are left untouched so a re-collected article is not re-translated.
/// Duplicate URLs inside the batch collapse to one row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails.
pub async fn upsert_articles(pool: &PgPool, articles: &[NewArticle]) -> Result<(u64, u64), DbError> {
    if articles.is_empty() {
        return Ok((0, 0));
    }

    let mut source_ids: Vec<Uuid> = Vec::with_capacity(articles.len());
    let mut urls: Vec<String> = Vec::with_capacity(articles.len());
    let mut titles: Vec<String> = Vec::with_capacity(articles.len());
    let mut contents: Vec<Option<String>> = Vec::with_capacity(articles.len());
    let mut published: Vec<DateTime<Utc>> = Vec::with_capacity(articles.len());

    for article in articles {
        source_ids.push(article.source_id);
        urls.push(article.original_url.clone());
        titles.push(article.original_title.clone());
        contents.push(article.original_content.clone());
        published.push(article.published_at);
    }

    let rows: Vec<bool> = sqlx::query_scalar::<_, bool>(
        "INSERT INTO articles \
             (source_id, original_url, original_title, original_content, published_at) \
         SELECT DISTINCT ON (original_url) source_id, original_url, original_title, \
                original_content, published_at \
         FROM UNNEST($1::uuid[], $2::text[], $3::text[], $4::text[], $5::timestamptz[]) \
              AS t(source_id, original_url, original_title, original_content, published_at) \
         ON CONFLICT (original_url) DO UPDATE SET \
             source_id        = EXCLUDED.source_id, \
             original_title   = EXCLUDED.original_title, \
             original_content = EXCLUDED.original_content, \
             published_at     = EXCLUDED.published_at, \
             updated_at       = NOW() \
         RETURNING (xmax = 0) AS is_new",
    )
    .bind(&source_ids)
    .bind(&urls)
    .bind(&titles)
    .bind(&contents)
    .bind(&published)
    .fetch_all(pool)
    .await?;

    let new_count = rows.iter().filter(|&&is_new| is_new).count() as u64;
    let updated_count = rows.len() as u64 - new_count;

    Ok((new_count, updated_count))
}

/// Returns up to `limit` untranslated articles, most recently published first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_untranslated_articles(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<UntranslatedArticleRow>, DbError> {
    let rows = sqlx::query_as::<_, UntranslatedArticleRow>(
        "SELECT id, original_title, original_content, published_at \
         FROM articles \
         WHERE is_translated = FALSE \
         ORDER BY published_at DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Mark `ids` as translated and tagged with a single topic.
///
/// Returns the number of rows updated.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn mark_articles_translated(
    pool: &PgPool,
    ids: &[Uuid],
    topic: Topic,
) -> Result<u64, DbError> {
    if ids.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query(
        "UPDATE articles \
         SET is_translated = TRUE, is_tagged = TRUE, topic = $1, updated_at = NOW() \
         WHERE id = ANY($2::uuid[])",
    )
    .bind(topic.as_str())
    .bind(ids)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
