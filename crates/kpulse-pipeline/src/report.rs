//! Run summaries returned by every pipeline operation.
//!
//! Runs are best-effort: failures of individual feeds, chunks, articles, or
//! groups are recorded here and the run carries on. Error lists are capped
//! so responses stay small.

use chrono::{DateTime, Utc};
use serde::Serialize;

pub const COLLECT_ERROR_CAP: usize = 15;
pub const FEED_RESULT_CAP: usize = 20;
pub const TRANSLATE_ERROR_CAP: usize = 10;
pub const ROUNDUP_ERROR_CAP: usize = 10;
pub const NEWS_CYCLE_ERROR_CAP: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedResult {
    pub feed: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectReport {
    /// Article rows written (inserted or refreshed).
    pub collected: u64,
    pub new_sources: usize,
    pub feeds_checked: usize,
    pub feed_results: Vec<FeedResult>,
    pub errors: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranslateReport {
    pub translated: usize,
    /// Articles selected for this batch.
    pub total: usize,
    pub errors: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundupReport {
    pub generated: usize,
    /// Groups that still needed a roundup this week.
    pub total: usize,
    /// Monday the roundup week starts on, `YYYY-MM-DD`.
    pub week: String,
    pub errors: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewsCycleReport {
    pub success: bool,
    pub collect: Option<CollectReport>,
    pub translate: Option<TranslateReport>,
    pub errors: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Truncate `errors` to `cap` entries.
pub(crate) fn capped(mut errors: Vec<String>, cap: usize) -> Vec<String> {
    errors.truncate(cap);
    errors
}
