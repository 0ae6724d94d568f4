use std::sync::Arc;

use chrono::{TimeZone, Utc};
use kpulse_core::{GroupRecord, IdolRecord};

use super::*;
use crate::testing::{direct_catalog, pipeline, MemoryStore, ScriptedModel, StaticFetcher};

const BTS_REPLY: &str = "```json\n{\"title\": \"BTS announce world tour\", \"summary\": \"BTS will tour in 2025.\", \"topic\": \"events\"}\n```";

fn translating_pipeline(store: &Arc<MemoryStore>, model: &Arc<ScriptedModel>) -> Pipeline {
    let fetcher = Arc::new(StaticFetcher::default());
    pipeline(store, &fetcher, direct_catalog(&[])).with_model(model.clone())
}

fn seed_bts(store: &MemoryStore) -> (Uuid, Uuid) {
    let group_id = Uuid::new_v4();
    let idol_id = Uuid::new_v4();
    let mut state = store.state();
    state.groups.push(GroupRecord {
        id: group_id,
        name: "BTS".to_string(),
        name_ko: Some("방탄소년단".to_string()),
    });
    state.idols.push(IdolRecord {
        id: idol_id,
        name: "Jungkook".to_string(),
        name_ko: Some("정국".to_string()),
        group_id: Some(group_id),
    });
    (group_id, idol_id)
}

#[test]
fn limit_defaults_and_clamps() {
    assert_eq!(clamp_limit(None), 5);
    assert_eq!(clamp_limit(Some(0)), 1);
    assert_eq!(clamp_limit(Some(7)), 7);
    assert_eq!(clamp_limit(Some(100)), 15);
}

#[test]
fn parses_fenced_reply_and_coerces_unknown_topic() {
    let parsed = parse_translation(BTS_REPLY).unwrap();
    assert_eq!(parsed.title, "BTS announce world tour");
    assert_eq!(parsed.topic, Topic::Events);

    let gossip =
        parse_translation("{\"title\": \"t\", \"summary\": \"s\", \"topic\": \"gossip\"}").unwrap();
    assert_eq!(gossip.topic, Topic::Buzz);

    let missing = parse_translation("{\"title\": \"t\", \"summary\": \"s\"}").unwrap();
    assert_eq!(missing.topic, Topic::Buzz);
}

#[test]
fn contract_violations_have_stable_reasons() {
    assert_eq!(parse_translation("  ").unwrap_err(), "Empty AI response");
    assert_eq!(
        parse_translation("I cannot help with that").unwrap_err(),
        "No JSON found: I cannot help with that"
    );
    assert_eq!(
        parse_translation("{\"title\": \"only title\"}").unwrap_err(),
        "Missing fields: {\"title\": \"only title\"}"
    );
}

#[test]
fn prompt_truncates_context_and_falls_back_to_title() {
    let long = UntranslatedArticle {
        id: Uuid::nil(),
        original_title: "제목".to_string(),
        original_content: Some("가".repeat(600)),
    };
    let prompt = translate_prompt(&long);
    assert!(prompt.contains(&"가".repeat(500)));
    assert!(!prompt.contains(&"가".repeat(501)));
    assert!(prompt.contains("방탄소년단=BTS"));

    let bare = UntranslatedArticle {
        original_content: None,
        ..long
    };
    assert!(translate_prompt(&bare).contains("Content: 제목"));
}

#[tokio::test]
async fn translates_tags_and_marks_articles() {
    let store = Arc::new(MemoryStore::default());
    let (group_id, idol_id) = seed_bts(&store);
    let published = Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap();
    let article_id = store.add_article("https://a.test/1", "방탄소년단 정국 월드투어", published);
    let model = Arc::new(ScriptedModel::new([Ok(BTS_REPLY)]));
    let pipeline = translating_pipeline(&store, &model);

    let report = pipeline.translate_batch(None).await.unwrap();

    assert_eq!(report.translated, 1);
    assert_eq!(report.total, 1);
    assert!(report.errors.is_empty(), "{:?}", report.errors);

    let requests = model.requests();
    assert_eq!(requests[0].max_tokens, 300);
    assert!(requests[0].prompt.contains("Title: 방탄소년단 정국 월드투어"));

    let state = store.state();
    let translation = &state.translations[&(article_id, "en".to_string())];
    assert_eq!(translation.translated_title, "BTS announce world tour");
    assert_eq!(translation.model_used, "llama-3.1-8b");
    assert_eq!(state.idol_tags[&(article_id, idol_id)], 0.95);
    assert_eq!(state.group_tags[&(article_id, group_id)], 0.95);
    let stored = &state.articles["https://a.test/1"];
    assert!(stored.is_translated);
    assert_eq!(stored.topic, Some(Topic::Events));
}

#[tokio::test]
async fn failed_article_is_skipped_and_left_untranslated() {
    let store = Arc::new(MemoryStore::default());
    let newer = Utc.with_ymd_and_hms(2025, 1, 7, 9, 0, 0).unwrap();
    let older = Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap();
    let bad_id = store.add_article("https://a.test/new", "새 기사", newer);
    store.add_article("https://a.test/old", "옛 기사", older);
    let model = Arc::new(ScriptedModel::new([
        Ok("Sorry, no JSON today."),
        Ok("{\"title\": \"Old story\", \"summary\": \"Fine.\", \"topic\": \"music\"}"),
    ]));
    let pipeline = translating_pipeline(&store, &model);

    let report = pipeline.translate_batch(Some(10)).await.unwrap();

    assert_eq!(report.translated, 1);
    assert_eq!(report.total, 2);
    assert_eq!(
        report.errors,
        vec![format!("Article {bad_id}: No JSON found: Sorry, no JSON today.")]
    );
    let state = store.state();
    assert!(!state.articles["https://a.test/new"].is_translated);
    assert!(state.articles["https://a.test/old"].is_translated);
    assert_eq!(state.translations.len(), 1);
}

#[tokio::test]
async fn model_transport_error_is_recorded_per_article() {
    let store = Arc::new(MemoryStore::default());
    let id = store.add_article("https://a.test/1", "기사", Utc::now());
    let model = Arc::new(ScriptedModel::new([Err("HTTP 500")]));
    let pipeline = translating_pipeline(&store, &model);

    let report = pipeline.translate_batch(None).await.unwrap();

    assert_eq!(report.translated, 0);
    assert_eq!(
        report.errors,
        vec![format!("Article {id}: model request failed: HTTP 500")]
    );
}

#[tokio::test]
async fn failed_translation_upsert_leaves_articles_unmarked() {
    let store = Arc::new(MemoryStore::default());
    store.add_article("https://a.test/1", "기사", Utc::now());
    store.state().fail_translation_upserts = true;
    let model = Arc::new(ScriptedModel::new([Ok(BTS_REPLY)]));
    let pipeline = translating_pipeline(&store, &model);

    let report = pipeline.translate_batch(None).await.unwrap();

    assert_eq!(report.translated, 0);
    assert_eq!(
        report.errors,
        vec!["Translations upsert: store error: translations unavailable".to_string()]
    );
    assert!(!store.state().articles["https://a.test/1"].is_translated);
}

#[tokio::test]
async fn empty_backlog_makes_no_model_calls() {
    let store = Arc::new(MemoryStore::default());
    let model = Arc::new(ScriptedModel::default());
    let pipeline = translating_pipeline(&store, &model);

    let report = pipeline.translate_batch(None).await.unwrap();

    assert_eq!(report.total, 0);
    assert!(model.requests().is_empty());
}

#[tokio::test]
async fn missing_model_is_an_error() {
    let store = Arc::new(MemoryStore::default());
    let fetcher = Arc::new(StaticFetcher::default());
    let pipeline = pipeline(&store, &fetcher, direct_catalog(&[]));

    let err = pipeline.translate_batch(None).await.unwrap_err();
    assert!(matches!(err, PipelineError::ModelUnavailable));
}

#[tokio::test]
async fn batch_errors_are_capped() {
    let store = Arc::new(MemoryStore::default());
    for day in 1..=12 {
        let published = Utc.with_ymd_and_hms(2025, 1, day, 9, 0, 0).unwrap();
        store.add_article(&format!("https://a.test/{day}"), "기사", published);
    }
    let model = Arc::new(ScriptedModel::new((0..12).map(|_| Ok("no json here"))));
    let pipeline = translating_pipeline(&store, &model);

    let report = pipeline.translate_batch(Some(MAX_TRANSLATE_LIMIT)).await.unwrap();

    assert_eq!(report.total, 12);
    assert_eq!(report.translated, 0);
    assert_eq!(model.requests().len(), 12);
    assert_eq!(report.errors.len(), TRANSLATE_ERROR_CAP);
    assert!(store.state().translations.is_empty());
}
