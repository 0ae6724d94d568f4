//! Records exchanged between the collection/tagging pipeline and storage.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Language code written on every translation produced by the pipeline.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Closed set of topic labels assigned to translated articles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    /// Comebacks, releases, charts, music shows.
    Music,
    /// Concerts, fan meetings, awards, variety shows.
    Events,
    /// Everything else.
    #[default]
    Buzz,
}

impl Topic {
    pub const ALL: [Topic; 3] = [Topic::Music, Topic::Events, Topic::Buzz];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Topic::Music => "music",
            Topic::Events => "events",
            Topic::Buzz => "buzz",
        }
    }

    /// Parse a model-supplied label. Surrounding whitespace and case are ignored.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|topic| topic.as_str().eq_ignore_ascii_case(label))
    }

    /// Parse a label, coercing anything missing or outside the set to [`Topic::Buzz`].
    #[must_use]
    pub fn from_label_or_default(label: Option<&str>) -> Self {
        label.and_then(Self::from_label).unwrap_or_default()
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted news outlet as seen by the source resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    pub id: Uuid,
    pub name: String,
}

/// An outlet queued for creation during a collect run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSource {
    pub name: String,
    pub url: String,
    pub category: String,
}

/// An article ready for upsert, keyed on `original_url`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewArticle {
    pub source_id: Uuid,
    pub original_url: String,
    pub original_title: String,
    pub original_content: Option<String>,
    pub published_at: DateTime<Utc>,
}

/// An article still waiting for translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UntranslatedArticle {
    pub id: Uuid,
    pub original_title: String,
    pub original_content: Option<String>,
}

/// One translation row, unique per `(article_id, language)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTranslation {
    pub article_id: Uuid,
    pub language: String,
    pub translated_title: String,
    pub translated_summary: String,
    pub translated_content: Option<String>,
    pub model_used: String,
}

/// Idol reference data used as a match target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdolRecord {
    pub id: Uuid,
    pub name: String,
    pub name_ko: Option<String>,
    pub group_id: Option<Uuid>,
}

/// Group reference data used as a match target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRecord {
    pub id: Uuid,
    pub name: String,
    pub name_ko: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IdolTag {
    pub article_id: Uuid,
    pub idol_id: Uuid,
    pub confidence: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupTag {
    pub article_id: Uuid,
    pub group_id: Uuid,
    pub confidence: f32,
}

/// A group eligible for a weekly roundup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundupGroup {
    pub id: Uuid,
    pub name: String,
    pub name_ko: Option<String>,
    pub slug: String,
}

/// A tagged, translated article feeding a weekly roundup prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundupArticle {
    pub id: Uuid,
    pub original_title: String,
    pub translated_title: Option<String>,
    pub translated_summary: Option<String>,
    pub published_at: DateTime<Utc>,
}

/// A weekly roundup row, unique per `(group_id, week_start)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewWeeklyRoundup {
    pub group_id: Uuid,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub title: String,
    pub summary: String,
    pub highlights: Vec<String>,
    pub article_count: i32,
    pub article_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentArticle {
    pub original_title: String,
    pub published_at: DateTime<Utc>,
    pub is_translated: bool,
}

/// Snapshot of pipeline progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineStatus {
    pub total_articles: i64,
    pub translated_articles: i64,
    pub untranslated_articles: i64,
    pub total_sources: i64,
    pub recent_articles: Vec<RecentArticle>,
}
