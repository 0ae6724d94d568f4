//! Database operations for the `sources` table.

use chrono::{DateTime, Utc};
use kpulse_core::{NewSource, SourceRecord};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `sources` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SourceRow {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

impl From<SourceRow> for SourceRecord {
    fn from(row: SourceRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

/// Returns every known source ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_sources(pool: &PgPool) -> Result<Vec<SourceRow>, DbError> {
    let rows = sqlx::query_as::<_, SourceRow>(
        "SELECT id, name, url, category, created_at \
         FROM sources \
         ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Create sources in one statement, keyed on the unique `name`.
///
/// Names that already exist are returned with their existing id and left
/// otherwise unchanged, so callers always get one row back per distinct name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails.
pub async fn create_sources(pool: &PgPool, sources: &[NewSource]) -> Result<Vec<SourceRow>, DbError> {
    if sources.is_empty() {
        return Ok(Vec::new());
    }

    let names: Vec<String> = sources.iter().map(|s| s.name.clone()).collect();
    let urls: Vec<String> = sources.iter().map(|s| s.url.clone()).collect();
    let categories: Vec<String> = sources.iter().map(|s| s.category.clone()).collect();

    // The no-op DO UPDATE makes RETURNING yield pre-existing rows as well.
    let rows = sqlx::query_as::<_, SourceRow>(
        "INSERT INTO sources (name, url, category) \
         SELECT DISTINCT ON (name) name, url, category \
         FROM UNNEST($1::text[], $2::text[], $3::text[]) AS t(name, url, category) \
         ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
         RETURNING id, name, url, category, created_at",
    )
    .bind(&names)
    .bind(&urls)
    .bind(&categories)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
