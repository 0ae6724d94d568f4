//! Seams between the pipeline and its collaborators.
//!
//! The pipeline receives these at construction so runs can be exercised
//! against in-memory fakes. Production wiring uses [`kpulse_feeds::FeedClient`],
//! [`crate::model::HttpModelClient`], and [`crate::store::PgPipelineStore`].

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use kpulse_core::{
    GroupRecord, GroupTag, IdolRecord, IdolTag, NewArticle, NewSource, NewTranslation,
    NewWeeklyRoundup, PipelineStatus, RoundupArticle, RoundupGroup, SourceRecord, Topic,
    UntranslatedArticle,
};
use kpulse_feeds::{FeedClient, FeedFetch};
use uuid::Uuid;

use crate::ledger::{RunType, TriggerSource};
use crate::PipelineError;

/// Fetch one feed. Failures are folded into [`FeedFetch::error`].
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FeedFetch;
}

#[async_trait]
impl FeedFetcher for FeedClient {
    async fn fetch(&self, url: &str) -> FeedFetch {
        self.fetch_feed(url).await
    }
}

/// One completion request to the language model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Send a prompt, get free text back. The text is untrusted.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, request: &ModelRequest) -> Result<String, PipelineError>;
}

/// Persistence operations the pipeline needs. Every write is a bulk,
/// idempotent upsert keyed on a natural uniqueness constraint.
#[async_trait]
pub trait PipelineStore: Send + Sync {
    async fn list_sources(&self) -> Result<Vec<SourceRecord>, PipelineError>;

    /// Create sources by name; existing names come back with their current id.
    async fn create_sources(
        &self,
        sources: &[NewSource],
    ) -> Result<Vec<SourceRecord>, PipelineError>;

    /// Upsert on `original_url`; returns the number of rows written.
    async fn upsert_articles(&self, articles: &[NewArticle]) -> Result<u64, PipelineError>;

    /// Untranslated articles, most recently published first.
    async fn list_untranslated(
        &self,
        limit: usize,
    ) -> Result<Vec<UntranslatedArticle>, PipelineError>;

    async fn list_idols(&self) -> Result<Vec<IdolRecord>, PipelineError>;

    async fn list_groups(&self) -> Result<Vec<GroupRecord>, PipelineError>;

    async fn upsert_translations(
        &self,
        translations: &[NewTranslation],
    ) -> Result<u64, PipelineError>;

    async fn upsert_idol_tags(&self, tags: &[IdolTag]) -> Result<u64, PipelineError>;

    async fn upsert_group_tags(&self, tags: &[GroupTag]) -> Result<u64, PipelineError>;

    /// Set the translated and tagged flags plus `topic` on every id.
    async fn mark_translated(&self, ids: &[Uuid], topic: Topic) -> Result<u64, PipelineError>;

    /// Priority slugs first, then by popularity, `limit` in total.
    async fn list_roundup_groups(
        &self,
        priority_slugs: &[String],
        limit: usize,
    ) -> Result<Vec<RoundupGroup>, PipelineError>;

    async fn roundup_group_ids_for_week(
        &self,
        week_start: NaiveDate,
    ) -> Result<Vec<Uuid>, PipelineError>;

    /// Translated articles tagged with the group, published in `[start, end]`,
    /// most recent first.
    async fn group_articles_in_range(
        &self,
        group_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RoundupArticle>, PipelineError>;

    async fn upsert_weekly_roundup(&self, roundup: &NewWeeklyRoundup)
        -> Result<(), PipelineError>;

    async fn status(&self) -> Result<PipelineStatus, PipelineError>;

    /// Open a ledger entry in `running` state and return its id.
    async fn begin_run(
        &self,
        run_type: RunType,
        trigger: TriggerSource,
    ) -> Result<i64, PipelineError>;

    async fn complete_run(&self, run_id: i64, records_processed: i32)
        -> Result<(), PipelineError>;

    async fn fail_run(&self, run_id: i64, error_message: &str) -> Result<(), PipelineError>;
}
