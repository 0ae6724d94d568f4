//! Translate-and-tag runs over the most recently published untranslated articles.

use chrono::Utc;
use kpulse_core::{NewTranslation, Topic, UntranslatedArticle, DEFAULT_LANGUAGE};
use kpulse_feeds::truncate_chars;
use serde_json::Value;
use uuid::Uuid;

use crate::json_contract::{extract_json_object, preview, required_str};
use crate::ports::ModelRequest;
use crate::report::{capped, TranslateReport, TRANSLATE_ERROR_CAP};
use crate::service::Pipeline;
use crate::tagger::{EntityIndex, TagSet, TagText};
use crate::PipelineError;

pub const DEFAULT_TRANSLATE_LIMIT: usize = 5;
pub const MAX_TRANSLATE_LIMIT: usize = 15;

const CONTEXT_MAX_CHARS: usize = 500;
const PREVIEW_CHARS: usize = 150;
const MAX_TOKENS: u32 = 300;
const TEMPERATURE: f32 = 0.3;

/// Parsed model answer for one article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTranslation {
    pub title: String,
    pub summary: String,
    pub topic: Topic,
}

/// Batch size for a requested limit: default 5, clamped to 1..=15.
#[must_use]
pub fn clamp_limit(limit: Option<usize>) -> usize {
    limit
        .unwrap_or(DEFAULT_TRANSLATE_LIMIT)
        .clamp(1, MAX_TRANSLATE_LIMIT)
}

impl Pipeline {
    /// Translate, classify, and tag up to `limit` untranslated articles.
    ///
    /// Per-article model failures and contract violations are recorded in
    /// the report and leave the article for a later run.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ModelUnavailable`] when no model is
    /// configured, or the store error when the backlog or reference data
    /// cannot be read.
    pub async fn translate_batch(
        &self,
        limit: Option<usize>,
    ) -> Result<TranslateReport, PipelineError> {
        let model = self.model()?;
        let articles = self.store().list_untranslated(clamp_limit(limit)).await?;
        let total = articles.len();
        if articles.is_empty() {
            return Ok(TranslateReport {
                translated: 0,
                total,
                errors: Vec::new(),
                timestamp: Utc::now(),
            });
        }

        let idols = self.store().list_idols().await?;
        let groups = self.store().list_groups().await?;
        let index = EntityIndex::new(&idols, &groups, self.ambiguous_names());

        let mut errors = Vec::new();
        let mut translations = Vec::with_capacity(total);
        let mut topics: Vec<(Uuid, Topic)> = Vec::with_capacity(total);
        let mut tags = TagSet::default();

        for article in &articles {
            let request = ModelRequest {
                prompt: translate_prompt(article),
                max_tokens: MAX_TOKENS,
                temperature: TEMPERATURE,
            };
            let parsed = match model.complete(&request).await {
                Ok(text) => parse_translation(&text),
                Err(e) => Err(e.to_string()),
            };
            let parsed = match parsed {
                Ok(parsed) => parsed,
                Err(reason) => {
                    tracing::warn!(article_id = %article.id, error = %reason, "translation skipped");
                    errors.push(format!("Article {}: {reason}", article.id));
                    continue;
                }
            };

            let text = TagText::new(format!(
                "{} {} {} {}",
                article.original_title,
                article.original_content.as_deref().unwrap_or_default(),
                parsed.title,
                parsed.summary,
            ));
            index.tag_article(article.id, &text, &mut tags);

            topics.push((article.id, parsed.topic));
            translations.push(NewTranslation {
                article_id: article.id,
                language: DEFAULT_LANGUAGE.to_string(),
                translated_title: parsed.title,
                translated_summary: parsed.summary,
                translated_content: None,
                model_used: self.settings().model_label.clone(),
            });
        }

        let translated = if translations.is_empty() {
            0
        } else {
            self.persist_batch(&translations, &tags, &topics, &mut errors)
                .await
        };

        tracing::info!(translated, total, errors = errors.len(), "translate finished");

        Ok(TranslateReport {
            translated,
            total,
            errors: capped(errors, TRANSLATE_ERROR_CAP),
            timestamp: Utc::now(),
        })
    }

    /// Write translations, then tags, then flip flags one topic at a time.
    /// Returns the number of articles marked translated.
    async fn persist_batch(
        &self,
        translations: &[NewTranslation],
        tags: &TagSet,
        topics: &[(Uuid, Topic)],
        errors: &mut Vec<String>,
    ) -> usize {
        let store = self.store();

        if let Err(e) = store.upsert_translations(translations).await {
            tracing::warn!(error = %e, "translation upsert failed");
            errors.push(format!("Translations upsert: {e}"));
            return 0;
        }
        if let Err(e) = store.upsert_idol_tags(&tags.idol_tags).await {
            tracing::warn!(error = %e, "idol tag upsert failed");
            errors.push(format!("Idol tags upsert: {e}"));
        }
        if let Err(e) = store.upsert_group_tags(&tags.group_tags).await {
            tracing::warn!(error = %e, "group tag upsert failed");
            errors.push(format!("Group tags upsert: {e}"));
        }

        let mut marked = 0;
        for topic in Topic::ALL {
            let ids: Vec<Uuid> = topics
                .iter()
                .filter(|(_, t)| *t == topic)
                .map(|(id, _)| *id)
                .collect();
            if ids.is_empty() {
                continue;
            }
            match store.mark_translated(&ids, topic).await {
                Ok(_) => marked += ids.len(),
                Err(e) => {
                    tracing::warn!(topic = %topic, error = %e, "article flag update failed");
                    errors.push(format!("Articles update ({topic}): {e}"));
                }
            }
        }
        marked
    }
}

fn translate_prompt(article: &UntranslatedArticle) -> String {
    let context = article
        .original_content
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or(&article.original_title);
    let context = truncate_chars(context, CONTEXT_MAX_CHARS);

    format!(
        "Translate this Korean K-pop news article to English and classify it.\n\n\
         Title: {title}\n\
         Content: {context}\n\n\
         Use the official romanized names for K-pop groups and idols \
         (e.g. 방탄소년단=BTS, 블랙핑크=BLACKPINK, 에스파=aespa, 뉴진스=NewJeans).\n\n\
         Classify the topic as exactly one of:\n\
         - music: comebacks, releases, charts, music shows\n\
         - events: concerts, fan meetings, awards, variety shows\n\
         - buzz: everything else\n\n\
         Respond ONLY with valid JSON in this format:\n\
         {{\"title\": \"English title\", \"summary\": \"1-2 sentence English summary\", \
         \"topic\": \"music|events|buzz\"}}",
        title = article.original_title,
    )
}

/// Validate a raw model answer. The error string is the per-article reason.
///
/// # Errors
///
/// Returns a reason when the answer is empty, holds no JSON object, or the
/// object lacks a non-blank `title` or `summary`.
pub fn parse_translation(text: &str) -> Result<ParsedTranslation, String> {
    if text.trim().is_empty() {
        return Err("Empty AI response".to_string());
    }
    let Some(object) = extract_json_object(text) else {
        return Err(format!("No JSON found: {}", preview(text, PREVIEW_CHARS)));
    };
    let (Some(title), Some(summary)) = (
        required_str(&object, "title"),
        required_str(&object, "summary"),
    ) else {
        return Err(format!("Missing fields: {}", preview(text, PREVIEW_CHARS)));
    };

    Ok(ParsedTranslation {
        title: title.trim().to_string(),
        summary: summary.trim().to_string(),
        topic: Topic::from_label_or_default(object.get("topic").and_then(Value::as_str)),
    })
}

#[cfg(test)]
#[path = "translator_test.rs"]
mod tests;
