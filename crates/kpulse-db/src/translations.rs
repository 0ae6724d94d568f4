//! Database operations for the `translations` table.

use kpulse_core::NewTranslation;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// Upsert translations keyed on `(article_id, language)`.
///
/// A re-run replaces the previous title, summary, content, and model id.
/// Returns the number of rows written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails.
pub async fn upsert_translations(
    pool: &PgPool,
    translations: &[NewTranslation],
) -> Result<u64, DbError> {
    if translations.is_empty() {
        return Ok(0);
    }

    let mut article_ids: Vec<Uuid> = Vec::with_capacity(translations.len());
    let mut languages: Vec<String> = Vec::with_capacity(translations.len());
    let mut titles: Vec<String> = Vec::with_capacity(translations.len());
    let mut summaries: Vec<String> = Vec::with_capacity(translations.len());
    let mut contents: Vec<Option<String>> = Vec::with_capacity(translations.len());
    let mut models: Vec<String> = Vec::with_capacity(translations.len());

    for t in translations {
        article_ids.push(t.article_id);
        languages.push(t.language.clone());
        titles.push(t.translated_title.clone());
        summaries.push(t.translated_summary.clone());
        contents.push(t.translated_content.clone());
        models.push(t.model_used.clone());
    }

    let result = sqlx::query(
        "INSERT INTO translations \
             (article_id, language, translated_title, translated_summary, \
              translated_content, model_used) \
         SELECT DISTINCT ON (article_id, language) * \
         FROM UNNEST($1::uuid[], $2::text[], $3::text[], $4::text[], $5::text[], $6::text[]) \
              AS t(article_id, language, translated_title, translated_summary, \
                   translated_content, model_used) \
         ON CONFLICT (article_id, language) DO UPDATE SET \
             translated_title   = EXCLUDED.translated_title, \
             translated_summary = EXCLUDED.translated_summary, \
             translated_content = EXCLUDED.translated_content, \
             model_used         = EXCLUDED.model_used, \
             updated_at         = NOW()",
    )
    .bind(&article_ids)
    .bind(&languages)
    .bind(&titles)
    .bind(&summaries)
    .bind(&contents)
    .bind(&models)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
