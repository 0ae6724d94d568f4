//! In-memory port implementations for pipeline tests.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use kpulse_core::{
    GroupRecord, GroupTag, IdolRecord, IdolTag, NewArticle, NewSource, NewTranslation,
    NewWeeklyRoundup, PipelineCatalog, PipelineStatus, RecentArticle, RoundupArticle,
    RoundupGroup, SourceRecord, Topic, UntranslatedArticle,
};
use kpulse_feeds::{host_of, parse_feed, FeedFetch};
use uuid::Uuid;

use crate::ledger::{RunType, TriggerSource};
use crate::ports::{FeedFetcher, ModelClient, ModelRequest, PipelineStore};
use crate::service::{Pipeline, PipelineSettings};
use crate::PipelineError;

#[derive(Debug, Clone)]
pub(crate) struct StoredArticle {
    pub id: Uuid,
    pub article: NewArticle,
    pub is_translated: bool,
    pub topic: Option<Topic>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RunOutcome {
    Running,
    Succeeded(i32),
    Failed(String),
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedRun {
    pub run_type: RunType,
    pub trigger: TriggerSource,
    pub outcome: RunOutcome,
}

#[derive(Debug, Default)]
pub(crate) struct MemoryState {
    pub sources: Vec<SourceRecord>,
    /// Keyed on original URL.
    pub articles: BTreeMap<String, StoredArticle>,
    pub translations: BTreeMap<(Uuid, String), NewTranslation>,
    pub idol_tags: BTreeMap<(Uuid, Uuid), f32>,
    pub group_tags: BTreeMap<(Uuid, Uuid), f32>,
    pub idols: Vec<IdolRecord>,
    pub groups: Vec<GroupRecord>,
    pub roundup_groups: Vec<RoundupGroup>,
    pub group_articles: HashMap<Uuid, Vec<RoundupArticle>>,
    pub roundups: BTreeMap<(Uuid, NaiveDate), NewWeeklyRoundup>,
    pub runs: Vec<RecordedRun>,
    pub fail_article_upserts: bool,
    pub fail_source_creation: bool,
    pub fail_translation_upserts: bool,
}

#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn with_sources(names: &[&str]) -> Self {
        let store = Self::default();
        store.state().sources = names
            .iter()
            .map(|name| SourceRecord {
                id: Uuid::new_v4(),
                name: (*name).to_string(),
            })
            .collect();
        store
    }

    pub fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().expect("memory store lock")
    }

    /// Seed an untranslated article and return its id.
    pub fn add_article(&self, url: &str, title: &str, published_at: DateTime<Utc>) -> Uuid {
        let id = Uuid::new_v4();
        self.state().articles.insert(
            url.to_string(),
            StoredArticle {
                id,
                article: NewArticle {
                    source_id: Uuid::nil(),
                    original_url: url.to_string(),
                    original_title: title.to_string(),
                    original_content: None,
                    published_at,
                },
                is_translated: false,
                topic: None,
            },
        );
        id
    }

    fn fail(what: &str) -> PipelineError {
        PipelineError::Store(format!("{what} unavailable"))
    }
}

fn to_u64(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

#[async_trait]
impl PipelineStore for MemoryStore {
    async fn list_sources(&self) -> Result<Vec<SourceRecord>, PipelineError> {
        Ok(self.state().sources.clone())
    }

    async fn create_sources(
        &self,
        sources: &[NewSource],
    ) -> Result<Vec<SourceRecord>, PipelineError> {
        let mut state = self.state();
        if state.fail_source_creation {
            return Err(Self::fail("sources"));
        }
        let mut out = Vec::new();
        for source in sources {
            let existing = state.sources.iter().find(|s| s.name == source.name).cloned();
            let record = existing.unwrap_or_else(|| {
                let record = SourceRecord {
                    id: Uuid::new_v4(),
                    name: source.name.clone(),
                };
                state.sources.push(record.clone());
                record
            });
            out.push(record);
        }
        Ok(out)
    }

    async fn upsert_articles(&self, articles: &[NewArticle]) -> Result<u64, PipelineError> {
        let mut state = self.state();
        if state.fail_article_upserts {
            return Err(Self::fail("articles"));
        }
        for article in articles {
            state
                .articles
                .entry(article.original_url.clone())
                .and_modify(|stored| stored.article = article.clone())
                .or_insert_with(|| StoredArticle {
                    id: Uuid::new_v4(),
                    article: article.clone(),
                    is_translated: false,
                    topic: None,
                });
        }
        Ok(to_u64(articles.len()))
    }

    async fn list_untranslated(
        &self,
        limit: usize,
    ) -> Result<Vec<UntranslatedArticle>, PipelineError> {
        let state = self.state();
        let mut pending: Vec<&StoredArticle> =
            state.articles.values().filter(|a| !a.is_translated).collect();
        pending.sort_by(|a, b| b.article.published_at.cmp(&a.article.published_at));
        Ok(pending
            .into_iter()
            .take(limit)
            .map(|a| UntranslatedArticle {
                id: a.id,
                original_title: a.article.original_title.clone(),
                original_content: a.article.original_content.clone(),
            })
            .collect())
    }

    async fn list_idols(&self) -> Result<Vec<IdolRecord>, PipelineError> {
        Ok(self.state().idols.clone())
    }

    async fn list_groups(&self) -> Result<Vec<GroupRecord>, PipelineError> {
        Ok(self.state().groups.clone())
    }

    async fn upsert_translations(
        &self,
        translations: &[NewTranslation],
    ) -> Result<u64, PipelineError> {
        let mut state = self.state();
        if state.fail_translation_upserts {
            return Err(Self::fail("translations"));
        }
        for t in translations {
            state
                .translations
                .insert((t.article_id, t.language.clone()), t.clone());
        }
        Ok(to_u64(translations.len()))
    }

    async fn upsert_idol_tags(&self, tags: &[IdolTag]) -> Result<u64, PipelineError> {
        let mut state = self.state();
        for tag in tags {
            state
                .idol_tags
                .insert((tag.article_id, tag.idol_id), tag.confidence);
        }
        Ok(to_u64(tags.len()))
    }

    async fn upsert_group_tags(&self, tags: &[GroupTag]) -> Result<u64, PipelineError> {
        let mut state = self.state();
        for tag in tags {
            state
                .group_tags
                .insert((tag.article_id, tag.group_id), tag.confidence);
        }
        Ok(to_u64(tags.len()))
    }

    async fn mark_translated(&self, ids: &[Uuid], topic: Topic) -> Result<u64, PipelineError> {
        let mut state = self.state();
        let mut updated = 0;
        for stored in state.articles.values_mut() {
            if ids.contains(&stored.id) {
                stored.is_translated = true;
                stored.topic = Some(topic);
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn list_roundup_groups(
        &self,
        priority_slugs: &[String],
        limit: usize,
    ) -> Result<Vec<RoundupGroup>, PipelineError> {
        let state = self.state();
        let (mut ordered, rest): (Vec<RoundupGroup>, Vec<RoundupGroup>) = state
            .roundup_groups
            .iter()
            .cloned()
            .partition(|g| priority_slugs.contains(&g.slug));
        ordered.extend(rest);
        ordered.truncate(limit);
        Ok(ordered)
    }

    async fn roundup_group_ids_for_week(
        &self,
        week_start: NaiveDate,
    ) -> Result<Vec<Uuid>, PipelineError> {
        Ok(self
            .state()
            .roundups
            .keys()
            .filter(|(_, week)| *week == week_start)
            .map(|(group_id, _)| *group_id)
            .collect())
    }

    async fn group_articles_in_range(
        &self,
        group_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RoundupArticle>, PipelineError> {
        let state = self.state();
        let mut articles: Vec<RoundupArticle> = state
            .group_articles
            .get(&group_id)
            .into_iter()
            .flatten()
            .filter(|a| a.published_at >= start && a.published_at <= end)
            .cloned()
            .collect();
        articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(articles)
    }

    async fn upsert_weekly_roundup(
        &self,
        roundup: &NewWeeklyRoundup,
    ) -> Result<(), PipelineError> {
        self.state()
            .roundups
            .insert((roundup.group_id, roundup.week_start), roundup.clone());
        Ok(())
    }

    async fn status(&self) -> Result<PipelineStatus, PipelineError> {
        let state = self.state();
        let total = state.articles.len();
        let translated = state.articles.values().filter(|a| a.is_translated).count();
        let count = |n: usize| i64::try_from(n).unwrap_or(i64::MAX);
        Ok(PipelineStatus {
            total_articles: count(total),
            translated_articles: count(translated),
            untranslated_articles: count(total - translated),
            total_sources: count(state.sources.len()),
            recent_articles: state
                .articles
                .values()
                .take(5)
                .map(|a| RecentArticle {
                    original_title: a.article.original_title.clone(),
                    published_at: a.article.published_at,
                    is_translated: a.is_translated,
                })
                .collect(),
        })
    }

    async fn begin_run(
        &self,
        run_type: RunType,
        trigger: TriggerSource,
    ) -> Result<i64, PipelineError> {
        let mut state = self.state();
        state.runs.push(RecordedRun {
            run_type,
            trigger,
            outcome: RunOutcome::Running,
        });
        Ok(i64::try_from(state.runs.len()).unwrap_or(i64::MAX))
    }

    async fn complete_run(
        &self,
        run_id: i64,
        records_processed: i32,
    ) -> Result<(), PipelineError> {
        self.close_run(run_id, RunOutcome::Succeeded(records_processed))
    }

    async fn fail_run(&self, run_id: i64, error_message: &str) -> Result<(), PipelineError> {
        self.close_run(run_id, RunOutcome::Failed(error_message.to_string()))
    }
}

impl MemoryStore {
    fn close_run(&self, run_id: i64, outcome: RunOutcome) -> Result<(), PipelineError> {
        let index = usize::try_from(run_id - 1).map_err(|_| Self::fail("run"))?;
        let mut state = self.state();
        let run = state.runs.get_mut(index).ok_or_else(|| Self::fail("run"))?;
        run.outcome = outcome;
        Ok(())
    }
}

/// Serves canned feed documents by URL; unknown URLs fail like a 404.
#[derive(Debug, Default)]
pub(crate) struct StaticFetcher {
    feeds: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn with_feed(mut self, url: &str, xml: &str) -> Self {
        self.feeds.insert(url.to_string(), xml.to_string());
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().expect("fetcher lock").clone()
    }
}

#[async_trait]
impl FeedFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> FeedFetch {
        self.requested
            .lock()
            .expect("fetcher lock")
            .push(url.to_string());
        match self.feeds.get(url) {
            Some(xml) => match parse_feed(xml, url) {
                Ok(items) => FeedFetch { items, error: None },
                Err(e) => FeedFetch {
                    items: Vec::new(),
                    error: Some(e.to_string()),
                },
            },
            None => FeedFetch {
                items: Vec::new(),
                error: Some(format!("HTTP 404 from {}", host_of(url))),
            },
        }
    }
}

/// Replays scripted completions in order and records every request.
#[derive(Debug, Default)]
pub(crate) struct ScriptedModel {
    responses: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedModel {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = Result<S, S>>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|r| r.map(Into::into).map_err(Into::into))
                    .collect(),
            ),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().expect("model lock").clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn complete(&self, request: &ModelRequest) -> Result<String, PipelineError> {
        self.requests
            .lock()
            .expect("model lock")
            .push(request.clone());
        match self.responses.lock().expect("model lock").pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(reason)) => Err(PipelineError::Model(reason)),
            None => Err(PipelineError::Model("no scripted response".to_string())),
        }
    }
}

/// Catalog with only the given direct feeds and no search queries.
pub(crate) fn direct_catalog(feeds: &[&str]) -> PipelineCatalog {
    PipelineCatalog {
        direct_feeds: feeds.iter().map(|f| (*f).to_string()).collect(),
        search_queries: Vec::new(),
        ..PipelineCatalog::default()
    }
}

pub(crate) fn pipeline(
    store: &Arc<MemoryStore>,
    fetcher: &Arc<StaticFetcher>,
    catalog: PipelineCatalog,
) -> Pipeline {
    Pipeline::new(
        store.clone(),
        fetcher.clone(),
        catalog,
        PipelineSettings::default(),
    )
}
