//! Postgres-backed [`PipelineStore`] and production wiring.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use kpulse_core::{
    load_catalog, AppConfig, GroupRecord, GroupTag, IdolRecord, IdolTag, NewArticle, NewSource,
    NewTranslation, NewWeeklyRoundup, PipelineCatalog, PipelineStatus, RoundupArticle,
    RoundupGroup, SourceRecord, Topic, UntranslatedArticle, DEFAULT_LANGUAGE,
};
use kpulse_feeds::FeedClient;
use sqlx::PgPool;
use uuid::Uuid;

use crate::ledger::{RunType, TriggerSource};
use crate::model::HttpModelClient;
use crate::ports::PipelineStore;
use crate::service::{Pipeline, PipelineSettings};
use crate::PipelineError;

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[derive(Debug, Clone)]
pub struct PgPipelineStore {
    pool: PgPool,
}

impl PgPipelineStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PipelineStore for PgPipelineStore {
    async fn list_sources(&self) -> Result<Vec<SourceRecord>, PipelineError> {
        let rows = kpulse_db::list_sources(&self.pool).await?;
        Ok(rows.into_iter().map(SourceRecord::from).collect())
    }

    async fn create_sources(
        &self,
        sources: &[NewSource],
    ) -> Result<Vec<SourceRecord>, PipelineError> {
        let rows = kpulse_db::create_sources(&self.pool, sources).await?;
        Ok(rows.into_iter().map(SourceRecord::from).collect())
    }

    async fn upsert_articles(&self, articles: &[NewArticle]) -> Result<u64, PipelineError> {
        let (inserted, updated) = kpulse_db::upsert_articles(&self.pool, articles).await?;
        tracing::debug!(inserted, updated, "article chunk upserted");
        Ok(inserted + updated)
    }

    async fn list_untranslated(
        &self,
        limit: usize,
    ) -> Result<Vec<UntranslatedArticle>, PipelineError> {
        let rows = kpulse_db::list_untranslated_articles(&self.pool, to_i64(limit)).await?;
        Ok(rows.into_iter().map(UntranslatedArticle::from).collect())
    }

    async fn list_idols(&self) -> Result<Vec<IdolRecord>, PipelineError> {
        let rows = kpulse_db::list_idols(&self.pool).await?;
        Ok(rows.into_iter().map(IdolRecord::from).collect())
    }

    async fn list_groups(&self) -> Result<Vec<GroupRecord>, PipelineError> {
        let rows = kpulse_db::list_groups(&self.pool).await?;
        Ok(rows.into_iter().map(GroupRecord::from).collect())
    }

    async fn upsert_translations(
        &self,
        translations: &[NewTranslation],
    ) -> Result<u64, PipelineError> {
        Ok(kpulse_db::upsert_translations(&self.pool, translations).await?)
    }

    async fn upsert_idol_tags(&self, tags: &[IdolTag]) -> Result<u64, PipelineError> {
        Ok(kpulse_db::upsert_idol_tags(&self.pool, tags).await?)
    }

    async fn upsert_group_tags(&self, tags: &[GroupTag]) -> Result<u64, PipelineError> {
        Ok(kpulse_db::upsert_group_tags(&self.pool, tags).await?)
    }

    async fn mark_translated(&self, ids: &[Uuid], topic: Topic) -> Result<u64, PipelineError> {
        Ok(kpulse_db::mark_articles_translated(&self.pool, ids, topic).await?)
    }

    async fn list_roundup_groups(
        &self,
        priority_slugs: &[String],
        limit: usize,
    ) -> Result<Vec<RoundupGroup>, PipelineError> {
        let rows =
            kpulse_db::list_roundup_groups(&self.pool, priority_slugs, to_i64(limit)).await?;
        Ok(rows.into_iter().map(RoundupGroup::from).collect())
    }

    async fn roundup_group_ids_for_week(
        &self,
        week_start: NaiveDate,
    ) -> Result<Vec<Uuid>, PipelineError> {
        Ok(kpulse_db::list_roundup_group_ids_for_week(&self.pool, week_start).await?)
    }

    async fn group_articles_in_range(
        &self,
        group_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RoundupArticle>, PipelineError> {
        let rows = kpulse_db::list_group_articles_in_range(
            &self.pool,
            group_id,
            start,
            end,
            DEFAULT_LANGUAGE,
        )
        .await?;
        Ok(rows.into_iter().map(RoundupArticle::from).collect())
    }

    async fn upsert_weekly_roundup(
        &self,
        roundup: &NewWeeklyRoundup,
    ) -> Result<(), PipelineError> {
        kpulse_db::upsert_weekly_roundup(&self.pool, roundup).await?;
        Ok(())
    }

    async fn status(&self) -> Result<PipelineStatus, PipelineError> {
        Ok(kpulse_db::pipeline_status(&self.pool).await?)
    }

    async fn begin_run(
        &self,
        run_type: RunType,
        trigger: TriggerSource,
    ) -> Result<i64, PipelineError> {
        let run =
            kpulse_db::create_pipeline_run(&self.pool, run_type.as_str(), trigger.as_str()).await?;
        kpulse_db::start_pipeline_run(&self.pool, run.id).await?;
        Ok(run.id)
    }

    async fn complete_run(
        &self,
        run_id: i64,
        records_processed: i32,
    ) -> Result<(), PipelineError> {
        Ok(kpulse_db::complete_pipeline_run(&self.pool, run_id, records_processed).await?)
    }

    async fn fail_run(&self, run_id: i64, error_message: &str) -> Result<(), PipelineError> {
        Ok(kpulse_db::fail_pipeline_run(&self.pool, run_id, error_message).await?)
    }
}

impl Pipeline {
    /// Wire the production collaborators: Postgres store, HTTP feed client,
    /// and the model client when `KPULSE_MODEL_URL` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog file cannot be loaded or an HTTP
    /// client cannot be built.
    pub fn from_app_config(config: &AppConfig, pool: PgPool) -> Result<Self, PipelineError> {
        let catalog = match &config.catalog_path {
            Some(path) => load_catalog(path)?,
            None => PipelineCatalog::default(),
        };
        let fetcher = FeedClient::new(
            config.feed_request_timeout_secs,
            &config.feed_user_agent,
            config.feed_max_retries,
            config.feed_retry_backoff_ms,
        )?;

        let pipeline = Pipeline::new(
            Arc::new(PgPipelineStore::new(pool)),
            Arc::new(fetcher),
            catalog,
            PipelineSettings::from_app_config(config),
        );

        match config.model_url.as_deref() {
            Some(url) => {
                let model = HttpModelClient::new(
                    url,
                    config.model_api_key.as_deref(),
                    &config.model_name,
                    config.model_timeout_secs,
                )?;
                Ok(pipeline.with_model(Arc::new(model)))
            }
            None => {
                tracing::warn!("KPULSE_MODEL_URL not set; translate and roundup runs are disabled");
                Ok(pipeline)
            }
        }
    }
}
