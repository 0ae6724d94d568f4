//! The pipeline service: injected collaborators plus run settings.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use kpulse_core::{AppConfig, PipelineCatalog, PipelineStatus};

use crate::ledger::{RunType, TriggerSource};
use crate::ports::{FeedFetcher, ModelClient, PipelineStore};
use crate::report::{
    capped, CollectReport, NewsCycleReport, RoundupReport, TranslateReport, NEWS_CYCLE_ERROR_CAP,
};
use crate::PipelineError;

/// Translate batch size used by the news cycle.
pub const NEWS_CYCLE_TRANSLATE_LIMIT: usize = 10;

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub query_batch_size: usize,
    pub rotation_window_secs: u64,
    pub upsert_chunk_size: usize,
    /// Model identifier recorded on each translation.
    pub model_label: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            query_batch_size: 3,
            rotation_window_secs: 900,
            upsert_chunk_size: 50,
            model_label: "llama-3.1-8b".to_string(),
        }
    }
}

impl PipelineSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            query_batch_size: config.query_batch_size,
            rotation_window_secs: config.rotation_window_secs,
            upsert_chunk_size: config.upsert_chunk_size,
            model_label: model_label(&config.model_name),
        }
    }
}

/// Short model label: last path segment without an `-instruct` suffix,
/// e.g. `@cf/meta/llama-3.1-8b-instruct` becomes `llama-3.1-8b`.
#[must_use]
pub fn model_label(model_name: &str) -> String {
    let last = model_name.rsplit('/').next().unwrap_or(model_name);
    last.strip_suffix("-instruct").unwrap_or(last).to_string()
}

#[derive(Clone)]
pub struct Pipeline {
    store: Arc<dyn PipelineStore>,
    fetcher: Arc<dyn FeedFetcher>,
    model: Option<Arc<dyn ModelClient>>,
    catalog: Arc<PipelineCatalog>,
    ambiguous_names: Arc<HashSet<String>>,
    settings: PipelineSettings,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        store: Arc<dyn PipelineStore>,
        fetcher: Arc<dyn FeedFetcher>,
        catalog: PipelineCatalog,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            store,
            fetcher,
            model: None,
            ambiguous_names: Arc::new(catalog.ambiguous_name_set()),
            catalog: Arc::new(catalog),
            settings,
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: Arc<dyn ModelClient>) -> Self {
        self.model = Some(model);
        self
    }

    pub(crate) fn store(&self) -> &dyn PipelineStore {
        self.store.as_ref()
    }

    pub(crate) fn fetcher(&self) -> &dyn FeedFetcher {
        self.fetcher.as_ref()
    }

    pub(crate) fn model(&self) -> Result<&dyn ModelClient, PipelineError> {
        self.model.as_deref().ok_or(PipelineError::ModelUnavailable)
    }

    pub(crate) fn catalog(&self) -> &PipelineCatalog {
        &self.catalog
    }

    pub(crate) fn ambiguous_names(&self) -> &HashSet<String> {
        &self.ambiguous_names
    }

    pub(crate) fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Article, translation, and source counts.
    ///
    /// # Errors
    ///
    /// Returns the store error when the counts cannot be read.
    pub async fn status(&self) -> Result<PipelineStatus, PipelineError> {
        self.store.status().await
    }

    /// [`Pipeline::collect`] recorded in the run ledger.
    ///
    /// # Errors
    ///
    /// Never fails today; the `Result` matches the other tracked runs.
    pub async fn collect_tracked(
        &self,
        trigger: TriggerSource,
    ) -> Result<CollectReport, PipelineError> {
        self.tracked(RunType::Collect, trigger, async {
            Ok(self.collect(Utc::now()).await)
        })
        .await
    }

    /// [`Pipeline::translate_batch`] recorded in the run ledger.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::translate_batch`].
    pub async fn translate_tracked(
        &self,
        limit: Option<usize>,
        trigger: TriggerSource,
    ) -> Result<TranslateReport, PipelineError> {
        self.tracked(RunType::Translate, trigger, self.translate_batch(limit))
            .await
    }

    /// [`Pipeline::generate_weekly_roundups`] recorded in the run ledger.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::generate_weekly_roundups`].
    pub async fn roundup_tracked(
        &self,
        trigger: TriggerSource,
    ) -> Result<RoundupReport, PipelineError> {
        self.tracked(
            RunType::Roundup,
            trigger,
            self.generate_weekly_roundups(Utc::now()),
        )
        .await
    }

    /// Collect, then translate one batch. A failing step is reported, never
    /// propagated.
    pub async fn run_news_cycle(&self, trigger: TriggerSource) -> NewsCycleReport {
        let mut errors = Vec::new();

        let collect = match self.collect_tracked(trigger).await {
            Ok(report) => Some(report),
            Err(e) => {
                errors.push(format!("Collect error: {e}"));
                None
            }
        };

        let translate = match self
            .translate_tracked(Some(NEWS_CYCLE_TRANSLATE_LIMIT), trigger)
            .await
        {
            Ok(report) => Some(report),
            Err(e) => {
                errors.push(format!("Translate error: {e}"));
                None
            }
        };

        tracing::info!(
            collected = collect.as_ref().map_or(0, |r| r.collected),
            translated = translate.as_ref().map_or(0, |r| r.translated),
            errors = errors.len(),
            "news cycle finished"
        );

        NewsCycleReport {
            success: errors.is_empty(),
            collect,
            translate,
            errors: capped(errors, NEWS_CYCLE_ERROR_CAP),
            timestamp: Utc::now(),
        }
    }
}
