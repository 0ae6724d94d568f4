//! Offline unit tests for kpulse-db pool configuration and row types.
//! These tests do not require a live database connection.

use chrono::Utc;
use kpulse_core::{
    AppConfig, Environment, IdolRecord, RecentArticle, RoundupArticle, SourceRecord,
    UntranslatedArticle,
};
use kpulse_db::{
    IdolRow, PipelineRunRow, PoolConfig, RecentArticleRow, RoundupArticleRow, SourceRow,
    UntranslatedArticleRow,
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use uuid::Uuid;

fn app_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        pipeline_secret: "secret".to_string(),
        catalog_path: None,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        feed_request_timeout_secs: 10,
        feed_user_agent: "ua".to_string(),
        feed_max_retries: 0,
        feed_retry_backoff_ms: 500,
        query_batch_size: 3,
        rotation_window_secs: 900,
        upsert_chunk_size: 50,
        model_url: None,
        model_api_key: None,
        model_name: "llama".to_string(),
        model_timeout_secs: 25,
        scheduler_enabled: false,
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm that [`PipelineRunRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn pipeline_run_row_has_expected_fields() {
    let row = PipelineRunRow {
        id: 1_i64,
        public_id: Uuid::new_v4(),
        run_type: "collect".to_string(),
        trigger_source: "cli".to_string(),
        status: "queued".to_string(),
        started_at: None,
        completed_at: None,
        records_processed: 0_i32,
        error_message: None,
        created_at: Utc::now(),
    };

    assert_eq!(row.run_type, "collect");
    assert_eq!(row.status, "queued");
    assert!(row.started_at.is_none());
    assert_eq!(row.records_processed, 0);
}

#[test]
fn source_row_converts_to_record() {
    let id = Uuid::new_v4();
    let row = SourceRow {
        id,
        name: "OSEN".to_string(),
        url: "https://www.osen.co.kr".to_string(),
        category: "news".to_string(),
        created_at: Utc::now(),
    };
    let record = SourceRecord::from(row);
    assert_eq!(record.id, id);
    assert_eq!(record.name, "OSEN");
}

#[test]
fn untranslated_row_drops_publication_time() {
    let id = Uuid::new_v4();
    let article = UntranslatedArticle::from(UntranslatedArticleRow {
        id,
        original_title: "방탄소년단 컴백".to_string(),
        original_content: Some("본문".to_string()),
        published_at: Utc::now(),
    });
    assert_eq!(article.id, id);
    assert_eq!(article.original_content.as_deref(), Some("본문"));
}

#[test]
fn idol_row_keeps_group_membership() {
    let group_id = Uuid::new_v4();
    let idol = IdolRecord::from(IdolRow {
        id: Uuid::new_v4(),
        name: "RM".to_string(),
        name_ko: Some("알엠".to_string()),
        group_id: Some(group_id),
    });
    assert_eq!(idol.group_id, Some(group_id));
}

#[test]
fn roundup_and_recent_rows_convert() {
    let now = Utc::now();
    let article = RoundupArticle::from(RoundupArticleRow {
        id: Uuid::new_v4(),
        original_title: "원제".to_string(),
        translated_title: Some("Title".to_string()),
        translated_summary: None,
        published_at: now,
    });
    assert_eq!(article.translated_title.as_deref(), Some("Title"));
    assert_eq!(article.published_at, now);

    let recent = RecentArticle::from(RecentArticleRow {
        original_title: "원제".to_string(),
        published_at: now,
        is_translated: true,
    });
    assert!(recent.is_translated);
}
