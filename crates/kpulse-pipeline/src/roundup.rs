//! Weekly per-group news roundups written by the language model.

use std::collections::HashSet;
use std::fmt::Write as _;

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeDelta, Utc};
use kpulse_core::{NewWeeklyRoundup, RoundupArticle, RoundupGroup};
use serde_json::Value;
use uuid::Uuid;

use crate::json_contract::{extract_json_object, required_str};
use crate::ports::{ModelClient, ModelRequest};
use crate::report::{capped, RoundupReport, ROUNDUP_ERROR_CAP};
use crate::service::Pipeline;
use crate::PipelineError;

/// Groups that always get a roundup when they had news.
pub const PRIORITY_GROUP_SLUGS: [&str; 3] = ["bts", "blackpink", "stray-kids"];
pub const MAX_ROUNDUP_GROUPS: usize = 13;

const PROMPT_ARTICLE_LIMIT: usize = 20;
const MAX_TOKENS: u32 = 1000;
const TEMPERATURE: f32 = 0.5;

/// Monday 00:00 through Sunday 23:59:59.999 UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundupWeek {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl RoundupWeek {
    #[must_use]
    pub fn start_date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    #[must_use]
    pub fn end_date(&self) -> NaiveDate {
        self.end.date_naive()
    }
}

/// The full calendar week before the one containing `now`.
#[must_use]
pub fn previous_week(now: DateTime<Utc>) -> RoundupWeek {
    let today = now.date_naive();
    let since_monday = u64::from(today.weekday().num_days_from_monday());
    let start_date = today
        .checked_sub_days(Days::new(since_monday + 7))
        .unwrap_or(today);
    let start = start_date.and_time(NaiveTime::MIN).and_utc();
    let end = start + TimeDelta::days(7) - TimeDelta::milliseconds(1);
    RoundupWeek { start, end }
}

impl Pipeline {
    /// Write a roundup for every target group that had tagged news last
    /// week and does not have one yet.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ModelUnavailable`] when no model is
    /// configured, or the store error when the target groups cannot be
    /// listed. Per-group failures are recorded in the report.
    pub async fn generate_weekly_roundups(
        &self,
        now: DateTime<Utc>,
    ) -> Result<RoundupReport, PipelineError> {
        let model = self.model()?;
        let week = previous_week(now);

        let priority: Vec<String> = PRIORITY_GROUP_SLUGS.iter().map(|s| (*s).to_string()).collect();
        let groups = self
            .store()
            .list_roundup_groups(&priority, MAX_ROUNDUP_GROUPS)
            .await?;
        let done: HashSet<Uuid> = self
            .store()
            .roundup_group_ids_for_week(week.start_date())
            .await?
            .into_iter()
            .collect();
        let pending: Vec<&RoundupGroup> = groups.iter().filter(|g| !done.contains(&g.id)).collect();

        let mut errors = Vec::new();
        let mut generated = 0;
        for group in &pending {
            match self.roundup_for_group(model, group, &week).await {
                Ok(true) => generated += 1,
                Ok(false) => {}
                Err(reason) => {
                    tracing::warn!(group = %group.slug, error = %reason, "roundup skipped");
                    errors.push(reason);
                }
            }
        }

        tracing::info!(
            generated,
            total = pending.len(),
            week = %week.start_date(),
            "weekly roundups finished"
        );

        Ok(RoundupReport {
            generated,
            total: pending.len(),
            week: week.start_date().to_string(),
            errors: capped(errors, ROUNDUP_ERROR_CAP),
            timestamp: Utc::now(),
        })
    }

    /// `Ok(false)` when the group had no news that week.
    async fn roundup_for_group(
        &self,
        model: &dyn ModelClient,
        group: &RoundupGroup,
        week: &RoundupWeek,
    ) -> Result<bool, String> {
        let name = &group.name;
        let articles = self
            .store()
            .group_articles_in_range(group.id, week.start, week.end)
            .await
            .map_err(|e| format!("{name}: {e}"))?;
        if articles.is_empty() {
            return Ok(false);
        }

        let request = ModelRequest {
            prompt: roundup_prompt(group, week, &articles),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };
        let text = model
            .complete(&request)
            .await
            .map_err(|e| format!("{name}: {e}"))?;

        let object =
            extract_json_object(&text).ok_or_else(|| format!("{name}: No JSON in AI response"))?;
        let (Some(title), Some(summary)) = (
            required_str(&object, "title"),
            required_str(&object, "summary"),
        ) else {
            return Err(format!("{name}: Missing title or summary"));
        };
        let highlights = object
            .get("highlights")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|h| !h.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let roundup = NewWeeklyRoundup {
            group_id: group.id,
            week_start: week.start_date(),
            week_end: week.end_date(),
            title: title.to_string(),
            summary: summary.to_string(),
            highlights,
            article_count: i32::try_from(articles.len()).unwrap_or(i32::MAX),
            article_ids: articles.iter().map(|a| a.id).collect(),
        };
        self.store()
            .upsert_weekly_roundup(&roundup)
            .await
            .map_err(|e| format!("{name} upsert: {e}"))?;

        Ok(true)
    }
}

fn roundup_prompt(group: &RoundupGroup, week: &RoundupWeek, articles: &[RoundupArticle]) -> String {
    let display_name = match group.name_ko.as_deref() {
        Some(ko) if !ko.trim().is_empty() => format!("{} ({ko})", group.name),
        _ => group.name.clone(),
    };

    let mut listing = String::new();
    for article in articles.iter().take(PROMPT_ARTICLE_LIMIT) {
        let title = article
            .translated_title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&article.original_title);
        let summary = article.translated_summary.as_deref().unwrap_or_default();
        let _ = writeln!(listing, "- {title}: {summary}");
    }

    format!(
        "You are a K-pop news editor for KpopPulse. Write a weekly news roundup for \
         {display_name} covering the week of {start} to {end}.\n\n\
         This week's articles:\n{listing}\n\
         Respond ONLY with valid JSON in this format:\n\
         {{\"title\": \"Catchy roundup headline\", \
         \"summary\": \"2-3 paragraph overview of the week\", \
         \"highlights\": [\"highlight 1\", \"highlight 2\", \"highlight 3\"]}}",
        start = week.start_date(),
        end = week.end_date(),
    )
}

#[cfg(test)]
#[path = "roundup_test.rs"]
mod tests;
