//! Database operations for the `article_idols` and `article_groups` link tables.

use kpulse_core::{GroupTag, IdolTag};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// Upsert idol tags keyed on `(article_id, idol_id)`; confidence is replaced.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails.
pub async fn upsert_idol_tags(pool: &PgPool, tags: &[IdolTag]) -> Result<u64, DbError> {
    if tags.is_empty() {
        return Ok(0);
    }

    let article_ids: Vec<Uuid> = tags.iter().map(|t| t.article_id).collect();
    let idol_ids: Vec<Uuid> = tags.iter().map(|t| t.idol_id).collect();
    let confidences: Vec<f32> = tags.iter().map(|t| t.confidence).collect();

    let result = sqlx::query(
        "INSERT INTO article_idols (article_id, idol_id, confidence) \
         SELECT DISTINCT ON (article_id, idol_id) * \
         FROM UNNEST($1::uuid[], $2::uuid[], $3::real[]) \
              AS t(article_id, idol_id, confidence) \
         ON CONFLICT (article_id, idol_id) DO UPDATE SET confidence = EXCLUDED.confidence",
    )
    .bind(&article_ids)
    .bind(&idol_ids)
    .bind(&confidences)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Upsert group tags keyed on `(article_id, group_id)`; confidence is replaced.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails.
pub async fn upsert_group_tags(pool: &PgPool, tags: &[GroupTag]) -> Result<u64, DbError> {
    if tags.is_empty() {
        return Ok(0);
    }

    let article_ids: Vec<Uuid> = tags.iter().map(|t| t.article_id).collect();
    let group_ids: Vec<Uuid> = tags.iter().map(|t| t.group_id).collect();
    let confidences: Vec<f32> = tags.iter().map(|t| t.confidence).collect();

    let result = sqlx::query(
        "INSERT INTO article_groups (article_id, group_id, confidence) \
         SELECT DISTINCT ON (article_id, group_id) * \
         FROM UNNEST($1::uuid[], $2::uuid[], $3::real[]) \
              AS t(article_id, group_id, confidence) \
         ON CONFLICT (article_id, group_id) DO UPDATE SET confidence = EXCLUDED.confidence",
    )
    .bind(&article_ids)
    .bind(&group_ids)
    .bind(&confidences)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
