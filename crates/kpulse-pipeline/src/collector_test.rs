use std::sync::Arc;

use chrono::TimeZone;
use kpulse_core::PipelineCatalog;

use super::*;
use crate::service::PipelineSettings;
use crate::testing::{direct_catalog, pipeline, MemoryStore, StaticFetcher};

const FEED: &str = "https://feeds.test/rss";
const SCENARIO_XML: &str = "<item><title>BTS returns</title><link>http://a.test/1</link></item>";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, 12, 0, 0).unwrap()
}

#[tokio::test]
async fn collecting_same_feed_twice_keeps_one_article() {
    let store = Arc::new(MemoryStore::default());
    let fetcher = Arc::new(StaticFetcher::default().with_feed(FEED, SCENARIO_XML));
    let pipeline = pipeline(&store, &fetcher, direct_catalog(&[FEED]));

    let first = pipeline.collect(now()).await;
    assert_eq!(first.collected, 1);
    assert_eq!(first.new_sources, 1);
    assert!(first.errors.is_empty(), "{:?}", first.errors);

    let second = pipeline.collect(now()).await;
    assert_eq!(second.new_sources, 0);

    let state = store.state();
    assert_eq!(state.articles.len(), 1);
    let stored = &state.articles["http://a.test/1"];
    assert_eq!(stored.article.original_title, "BTS returns");
    assert_eq!(state.sources.len(), 1);
    assert_eq!(state.sources[0].name, "a.test");
}

#[tokio::test]
async fn duplicate_links_across_feeds_are_collected_once() {
    let other = "https://mirror.test/rss";
    let store = Arc::new(MemoryStore::with_sources(&["a.test"]));
    let fetcher = Arc::new(
        StaticFetcher::default()
            .with_feed(FEED, SCENARIO_XML)
            .with_feed(other, SCENARIO_XML),
    );
    let pipeline = pipeline(&store, &fetcher, direct_catalog(&[FEED, other]));

    let report = pipeline.collect(now()).await;

    assert_eq!(report.collected, 1);
    assert_eq!(report.feeds_checked, 2);
    assert_eq!(
        report.feed_results,
        vec![
            FeedResult {
                feed: "feeds.test".to_string(),
                count: 1
            },
            FeedResult {
                feed: "mirror.test".to_string(),
                count: 0
            },
        ]
    );
}

#[tokio::test]
async fn localized_outlet_name_resolves_to_existing_source() {
    let xml = r#"<item><title>방탄소년단 컴백</title><link>https://news.test/9</link>
        <source url="https://www.osen.co.kr">오센</source></item>"#;
    let store = Arc::new(MemoryStore::with_sources(&["OSEN"]));
    let osen_id = store.state().sources[0].id;
    let fetcher = Arc::new(StaticFetcher::default().with_feed(FEED, xml));
    let pipeline = pipeline(&store, &fetcher, direct_catalog(&[FEED]));

    let report = pipeline.collect(now()).await;

    assert_eq!(report.new_sources, 0);
    let state = store.state();
    assert_eq!(state.articles["https://news.test/9"].article.source_id, osen_id);
}

#[tokio::test]
async fn broken_feed_is_reported_and_others_still_collect() {
    let store = Arc::new(MemoryStore::with_sources(&["a.test"]));
    let fetcher = Arc::new(StaticFetcher::default().with_feed(FEED, SCENARIO_XML));
    let pipeline = pipeline(
        &store,
        &fetcher,
        direct_catalog(&["https://missing.test/feed", FEED]),
    );

    let report = pipeline.collect(now()).await;

    assert_eq!(report.collected, 1);
    assert_eq!(report.errors, vec!["HTTP 404 from missing.test".to_string()]);
    assert_eq!(report.feed_results[0].count, 0);
}

#[tokio::test]
async fn failed_chunk_is_recorded_without_aborting() {
    let store = Arc::new(MemoryStore::with_sources(&["a.test"]));
    store.state().fail_article_upserts = true;
    let fetcher = Arc::new(StaticFetcher::default().with_feed(FEED, SCENARIO_XML));
    let pipeline = pipeline(&store, &fetcher, direct_catalog(&[FEED]));

    let report = pipeline.collect(now()).await;

    assert_eq!(report.collected, 0);
    assert_eq!(
        report.errors,
        vec!["DB batch: store error: articles unavailable".to_string()]
    );
}

#[tokio::test]
async fn articles_are_upserted_in_chunks() {
    let xml: String = (0..5)
        .map(|i| format!("<item><title>Story {i}</title><link>http://a.test/{i}</link></item>"))
        .collect();
    let store = Arc::new(MemoryStore::with_sources(&["a.test"]));
    let fetcher = Arc::new(StaticFetcher::default().with_feed(FEED, &xml));
    let settings = PipelineSettings {
        upsert_chunk_size: 2,
        ..PipelineSettings::default()
    };
    let pipeline = Pipeline::new(
        store.clone(),
        fetcher.clone(),
        direct_catalog(&[FEED]),
        settings,
    );

    let report = pipeline.collect(now()).await;

    assert_eq!(report.collected, 5);
    assert_eq!(store.state().articles.len(), 5);
}

#[tokio::test]
async fn search_feeds_follow_rotation_and_hide_empty_results() {
    let catalog = PipelineCatalog {
        direct_feeds: Vec::new(),
        search_queries: vec![
            "BTS 방탄소년단".to_string(),
            "aespa 에스파".to_string(),
            "IVE 아이브".to_string(),
            "TWICE 트와이스".to_string(),
        ],
        ..PipelineCatalog::default()
    };
    let store = Arc::new(MemoryStore::with_sources(&["a.test"]));
    let first_query_url = search_feed_url("BTS 방탄소년단");
    let fetcher = Arc::new(StaticFetcher::default().with_feed(&first_query_url, SCENARIO_XML));
    let pipeline = pipeline(&store, &fetcher, catalog);

    let epoch = Utc.timestamp_opt(0, 0).unwrap();
    let report = pipeline.collect(epoch).await;

    assert_eq!(report.feeds_checked, 3);
    assert_eq!(
        fetcher.requested(),
        vec![
            first_query_url,
            search_feed_url("aespa 에스파"),
            search_feed_url("IVE 아이브"),
        ]
    );
    assert_eq!(
        report.feed_results,
        vec![FeedResult {
            feed: "google:BTS 방탄소년단".to_string(),
            count: 1
        }]
    );
    assert_eq!(report.errors.len(), 2);
}

#[tokio::test]
async fn source_creation_failure_falls_back_to_known_source() {
    let store = Arc::new(MemoryStore::with_sources(&["Soompi"]));
    let soompi_id = store.state().sources[0].id;
    store.state().fail_source_creation = true;
    let fetcher = Arc::new(StaticFetcher::default().with_feed(FEED, SCENARIO_XML));
    let pipeline = pipeline(&store, &fetcher, direct_catalog(&[FEED]));

    let report = pipeline.collect(now()).await;

    assert_eq!(report.collected, 1);
    assert_eq!(report.new_sources, 0);
    assert_eq!(
        report.errors,
        vec!["Sources: store error: sources unavailable".to_string()]
    );
    assert_eq!(
        store.state().articles["http://a.test/1"].article.source_id,
        soompi_id
    );
}

#[tokio::test]
async fn articles_without_any_source_are_skipped() {
    let store = Arc::new(MemoryStore::default());
    store.state().fail_source_creation = true;
    let fetcher = Arc::new(StaticFetcher::default().with_feed(FEED, SCENARIO_XML));
    let pipeline = pipeline(&store, &fetcher, direct_catalog(&[FEED]));

    let report = pipeline.collect(now()).await;

    assert_eq!(report.collected, 0);
    assert!(report
        .errors
        .contains(&"Skipped 1 articles with no source".to_string()));
    assert!(store.state().articles.is_empty());
}

#[test]
fn published_time_accepts_rss_and_atom_formats() {
    let rss = parse_published("Mon, 06 Jan 2025 09:30:00 GMT", now());
    assert_eq!(rss, Utc.with_ymd_and_hms(2025, 1, 6, 9, 30, 0).unwrap());

    let atom = parse_published("2025-01-06T10:00:00+09:00", now());
    assert_eq!(atom, Utc.with_ymd_and_hms(2025, 1, 6, 1, 0, 0).unwrap());
}

#[test]
fn unparseable_published_time_falls_back_to_now() {
    assert_eq!(parse_published("", now()), now());
    assert_eq!(parse_published("yesterday-ish", now()), now());
}

#[tokio::test]
async fn errors_and_feed_results_are_capped() {
    let urls: Vec<String> = (0..25).map(|i| format!("https://down{i}.test/rss")).collect();
    let feeds: Vec<&str> = urls.iter().map(String::as_str).collect();
    let store = Arc::new(MemoryStore::with_sources(&["a.test"]));
    let fetcher = Arc::new(StaticFetcher::default());
    let pipeline = pipeline(&store, &fetcher, direct_catalog(&feeds));

    let report = pipeline.collect(now()).await;

    assert_eq!(report.feeds_checked, 25);
    assert_eq!(report.collected, 0);
    assert_eq!(report.errors.len(), COLLECT_ERROR_CAP);
    assert_eq!(report.errors[0], "HTTP 404 from down0.test");
    assert_eq!(report.feed_results.len(), FEED_RESULT_CAP);
    assert!(report.feed_results.iter().all(|r| r.count == 0));
}
