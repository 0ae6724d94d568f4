//! Read-only queries over the curated `idols` and `groups` reference tables.

use kpulse_core::{GroupRecord, IdolRecord, RoundupGroup};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IdolRow {
    pub id: Uuid,
    pub name: String,
    pub name_ko: Option<String>,
    pub group_id: Option<Uuid>,
}

impl From<IdolRow> for IdolRecord {
    fn from(row: IdolRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            name_ko: row.name_ko,
            group_id: row.group_id,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GroupRow {
    pub id: Uuid,
    pub name: String,
    pub name_ko: Option<String>,
}

impl From<GroupRow> for GroupRecord {
    fn from(row: GroupRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            name_ko: row.name_ko,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RoundupGroupRow {
    pub id: Uuid,
    pub name: String,
    pub name_ko: Option<String>,
    pub slug: String,
}

impl From<RoundupGroupRow> for RoundupGroup {
    fn from(row: RoundupGroupRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            name_ko: row.name_ko,
            slug: row.slug,
        }
    }
}

/// Returns every active idol.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_idols(pool: &PgPool) -> Result<Vec<IdolRow>, DbError> {
    let rows = sqlx::query_as::<_, IdolRow>(
        "SELECT id, name, name_ko, group_id FROM idols WHERE is_active = TRUE ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Returns every active group.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_groups(pool: &PgPool) -> Result<Vec<GroupRow>, DbError> {
    let rows = sqlx::query_as::<_, GroupRow>(
        "SELECT id, name, name_ko FROM groups WHERE is_active = TRUE ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Returns the groups that get a weekly roundup: every group whose slug is in
/// `priority_slugs`, then the most popular remaining groups, `limit` in total.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_roundup_groups(
    pool: &PgPool,
    priority_slugs: &[String],
    limit: i64,
) -> Result<Vec<RoundupGroupRow>, DbError> {
    let rows = sqlx::query_as::<_, RoundupGroupRow>(
        "SELECT id, name, name_ko, slug \
         FROM groups \
         WHERE is_active = TRUE \
         ORDER BY (slug = ANY($1::text[])) DESC, popularity_score DESC, name \
         LIMIT $2",
    )
    .bind(priority_slugs)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
