//! Collect runs: fetch the direct feeds plus one rotation slice of search
//! feeds, dedupe by link, resolve sources, and upsert articles in chunks.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use kpulse_core::NewArticle;
use kpulse_feeds::{host_of, search_feed_url, truncate_chars, FeedItem};

use crate::report::{capped, CollectReport, FeedResult, COLLECT_ERROR_CAP, FEED_RESULT_CAP};
use crate::resolver::{source_name_from_url, SourceRef, SourceResolver};
use crate::rotation::rotation_batch;
use crate::service::Pipeline;

const SEARCH_LABEL_CHARS: usize = 20;

/// One feed scheduled for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PlannedFeed {
    url: String,
    label: String,
    /// Direct feeds are always listed in `feed_results`; search feeds only
    /// when they contributed items.
    always_report: bool,
}

/// An accepted item waiting for its source id.
struct PendingArticle {
    source: SourceRef,
    url: String,
    title: String,
    content: Option<String>,
    published_at: DateTime<Utc>,
}

impl Pipeline {
    /// Run one collect pass.
    ///
    /// Feed, source, and chunk failures are recorded in the report; the run
    /// itself never fails.
    pub async fn collect(&self, now: DateTime<Utc>) -> CollectReport {
        let mut errors = Vec::new();

        let sources = match self.store().list_sources().await {
            Ok(sources) => sources,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load sources");
                errors.push(format!("Sources: {e}"));
                Vec::new()
            }
        };
        let mut resolver = SourceResolver::new(&sources, &self.catalog().source_aliases);

        let plan = self.plan_feeds(now);
        let mut seen: HashSet<String> = HashSet::new();
        let mut accepted: Vec<PendingArticle> = Vec::new();
        let mut feed_results = Vec::new();

        for feed in &plan {
            let fetched = self.fetcher().fetch(&feed.url).await;
            if let Some(error) = fetched.error {
                tracing::warn!(feed = %feed.label, error = %error, "feed contributed no items");
                errors.push(error);
            }

            let mut count = 0usize;
            for item in fetched.items {
                if !seen.insert(item.link.clone()) {
                    continue;
                }
                accepted.push(accept_item(item, &feed.url, &mut resolver, now));
                count += 1;
            }

            tracing::debug!(feed = %feed.label, count, "feed processed");
            if feed.always_report || count > 0 {
                feed_results.push(FeedResult {
                    feed: feed.label.clone(),
                    count,
                });
            }
        }

        let new_sources = self.flush_sources(&mut resolver, &mut errors).await;

        let mut articles = Vec::with_capacity(accepted.len());
        let mut unsourced = 0usize;
        for pending in accepted {
            let Some(source_id) = resolver.id_for(pending.source) else {
                unsourced += 1;
                continue;
            };
            articles.push(NewArticle {
                source_id,
                original_url: pending.url,
                original_title: pending.title,
                original_content: pending.content,
                published_at: pending.published_at,
            });
        }
        if unsourced > 0 {
            errors.push(format!("Skipped {unsourced} articles with no source"));
        }

        let mut collected = 0u64;
        for chunk in articles.chunks(self.settings().upsert_chunk_size.max(1)) {
            match self.store().upsert_articles(chunk).await {
                Ok(written) => collected += written,
                Err(e) => {
                    tracing::warn!(chunk_len = chunk.len(), error = %e, "article chunk upsert failed");
                    errors.push(format!("DB batch: {e}"));
                }
            }
        }

        tracing::info!(
            collected,
            new_sources,
            feeds_checked = plan.len(),
            errors = errors.len(),
            "collect finished"
        );

        feed_results.truncate(FEED_RESULT_CAP);
        CollectReport {
            collected,
            new_sources,
            feeds_checked: plan.len(),
            feed_results,
            errors: capped(errors, COLLECT_ERROR_CAP),
            timestamp: Utc::now(),
        }
    }

    /// Direct feeds first, then the search queries for the window containing `now`.
    fn plan_feeds(&self, now: DateTime<Utc>) -> Vec<PlannedFeed> {
        let catalog = self.catalog();
        let settings = self.settings();

        let direct = catalog.direct_feeds.iter().map(|url| PlannedFeed {
            url: url.clone(),
            label: host_of(url),
            always_report: true,
        });
        let search = rotation_batch(
            &catalog.search_queries,
            settings.query_batch_size,
            settings.rotation_window_secs,
            now,
        )
        .iter()
        .map(|query| PlannedFeed {
            url: search_feed_url(query),
            label: format!("google:{}", truncate_chars(query, SEARCH_LABEL_CHARS)),
            always_report: false,
        });

        direct.chain(search).collect()
    }

    /// Create every queued source in one write. Returns how many were created.
    async fn flush_sources(&self, resolver: &mut SourceResolver, errors: &mut Vec<String>) -> usize {
        let pending = resolver.pending().len();
        if pending == 0 {
            return 0;
        }
        match self.store().create_sources(resolver.pending()).await {
            Ok(created) => {
                resolver.apply_created(&created);
                pending
            }
            Err(e) => {
                tracing::warn!(pending, error = %e, "failed to create sources");
                errors.push(format!("Sources: {e}"));
                0
            }
        }
    }
}

fn accept_item(
    item: FeedItem,
    feed_url: &str,
    resolver: &mut SourceResolver,
    now: DateTime<Utc>,
) -> PendingArticle {
    let name = if item.source_name.trim().is_empty() {
        source_name_from_url(&item.link)
    } else {
        item.source_name
    };
    let hint = if item.source_url.is_empty() {
        feed_url
    } else {
        item.source_url.as_str()
    };
    let source = resolver.resolve(&name, hint);

    PendingArticle {
        source,
        published_at: parse_published(&item.pub_date, now),
        content: Some(item.description).filter(|d| !d.is_empty()),
        url: item.link,
        title: item.title,
    }
}

/// RFC 2822 (RSS) or RFC 3339 (Atom) timestamp, falling back to `now`.
pub(crate) fn parse_published(raw: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map_or(now, |parsed| parsed.with_timezone(&Utc))
}

#[cfg(test)]
#[path = "collector_test.rs"]
mod tests;
