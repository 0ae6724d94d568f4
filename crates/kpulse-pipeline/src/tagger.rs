//! Entity tagging: find idol and group names in article text.
//!
//! Matching runs an ordered chain of tiers; the first tier that decides wins.
//!
//! | Tier          | Applies to                                  | Result          |
//! |---------------|---------------------------------------------|-----------------|
//! | Korean        | Korean name (2+ chars) found verbatim       | match, 0.95     |
//! | Single char   | English name of one character               | no match        |
//! | Word boundary | names of 3 chars or fewer, ambiguous names  | whole word, 0.8 |
//! | Substring     | everything else                             | substring, 0.9  |

use std::collections::HashSet;

use kpulse_core::{GroupRecord, GroupTag, IdolRecord, IdolTag};
use regex::Regex;
use uuid::Uuid;

pub const KOREAN_CONFIDENCE: f32 = 0.95;
pub const WORD_BOUNDARY_CONFIDENCE: f32 = 0.8;
pub const SUBSTRING_CONFIDENCE: f32 = 0.9;

/// Outcome of one tier.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Verdict {
    Match(f32),
    Reject,
    /// The tier does not apply; ask the next one.
    Pass,
}

/// A name prepared for matching: lowercased, with its whole-word pattern
/// compiled once when the name needs one.
#[derive(Debug, Clone)]
pub struct NamePattern {
    name_lower: String,
    name_ko: Option<String>,
    whole_word: Option<Regex>,
}

impl NamePattern {
    #[must_use]
    pub fn new(name: &str, name_ko: Option<&str>, ambiguous: &HashSet<String>) -> Self {
        let name_lower = name.trim().to_lowercase();
        let length = name_lower.chars().count();
        let needs_boundary = length > 1 && (length <= 3 || ambiguous.contains(&name_lower));
        // ASCII word boundaries so Korean particles glued to a name ("RM이")
        // still count as a boundary.
        let whole_word = needs_boundary
            .then(|| {
                Regex::new(&format!(
                    r"(?i)(?-u:\b){}(?-u:\b)",
                    regex::escape(&name_lower)
                ))
                .ok()
            })
            .flatten();

        Self {
            name_lower,
            name_ko: name_ko
                .map(str::trim)
                .filter(|ko| ko.chars().count() >= 2)
                .map(str::to_string),
            whole_word,
        }
    }

    /// Confidence that `text` mentions this name, or `None`.
    #[must_use]
    pub fn confidence(&self, text: &TagText) -> Option<f32> {
        TIERS
            .iter()
            .map(|tier| tier(self, text))
            .find(|verdict| *verdict != Verdict::Pass)
            .and_then(|verdict| match verdict {
                Verdict::Match(confidence) => Some(confidence),
                Verdict::Reject | Verdict::Pass => None,
            })
    }
}

/// Article text with its lowercase form computed once.
#[derive(Debug, Clone)]
pub struct TagText {
    raw: String,
    lower: String,
}

impl TagText {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let lower = raw.to_lowercase();
        Self { raw, lower }
    }
}

type Tier = fn(&NamePattern, &TagText) -> Verdict;

const TIERS: [Tier; 4] = [korean_tier, single_char_tier, word_boundary_tier, substring_tier];

fn korean_tier(pattern: &NamePattern, text: &TagText) -> Verdict {
    match &pattern.name_ko {
        Some(ko) if text.raw.contains(ko.as_str()) => Verdict::Match(KOREAN_CONFIDENCE),
        _ => Verdict::Pass,
    }
}

fn single_char_tier(pattern: &NamePattern, _text: &TagText) -> Verdict {
    if pattern.name_lower.chars().count() <= 1 {
        Verdict::Reject
    } else {
        Verdict::Pass
    }
}

fn word_boundary_tier(pattern: &NamePattern, text: &TagText) -> Verdict {
    match &pattern.whole_word {
        Some(re) if re.is_match(&text.raw) => Verdict::Match(WORD_BOUNDARY_CONFIDENCE),
        Some(_) => Verdict::Reject,
        None => Verdict::Pass,
    }
}

fn substring_tier(pattern: &NamePattern, text: &TagText) -> Verdict {
    if text.lower.contains(&pattern.name_lower) {
        Verdict::Match(SUBSTRING_CONFIDENCE)
    } else {
        Verdict::Reject
    }
}

/// One-off match of a single name against `text`.
#[must_use]
pub fn match_name(
    name: &str,
    name_ko: Option<&str>,
    text: &str,
    ambiguous: &HashSet<String>,
) -> Option<f32> {
    NamePattern::new(name, name_ko, ambiguous).confidence(&TagText::new(text))
}

struct IdolEntry {
    id: Uuid,
    group_id: Option<Uuid>,
    pattern: NamePattern,
}

struct GroupEntry {
    id: Uuid,
    pattern: NamePattern,
}

/// Every known idol and group with patterns compiled for a batch.
pub struct EntityIndex {
    idols: Vec<IdolEntry>,
    groups: Vec<GroupEntry>,
}

/// Tags produced for a batch, unique per (article, entity).
#[derive(Debug, Default)]
pub struct TagSet {
    pub idol_tags: Vec<IdolTag>,
    pub group_tags: Vec<GroupTag>,
    seen_idols: HashSet<(Uuid, Uuid)>,
    seen_groups: HashSet<(Uuid, Uuid)>,
}

impl TagSet {
    fn push_idol(&mut self, tag: IdolTag) {
        if self.seen_idols.insert((tag.article_id, tag.idol_id)) {
            self.idol_tags.push(tag);
        }
    }

    fn push_group(&mut self, tag: GroupTag) {
        if self.seen_groups.insert((tag.article_id, tag.group_id)) {
            self.group_tags.push(tag);
        }
    }
}

impl EntityIndex {
    #[must_use]
    pub fn new(idols: &[IdolRecord], groups: &[GroupRecord], ambiguous: &HashSet<String>) -> Self {
        Self {
            idols: idols
                .iter()
                .map(|idol| IdolEntry {
                    id: idol.id,
                    group_id: idol.group_id,
                    pattern: NamePattern::new(&idol.name, idol.name_ko.as_deref(), ambiguous),
                })
                .collect(),
            groups: groups
                .iter()
                .map(|group| GroupEntry {
                    id: group.id,
                    pattern: NamePattern::new(&group.name, group.name_ko.as_deref(), ambiguous),
                })
                .collect(),
        }
    }

    /// Tag one article. An idol match also tags the idol's group with the
    /// same confidence. When both an implied and a direct group match occur,
    /// the first one recorded is kept.
    pub fn tag_article(&self, article_id: Uuid, text: &TagText, tags: &mut TagSet) {
        for idol in &self.idols {
            let Some(confidence) = idol.pattern.confidence(text) else {
                continue;
            };
            tags.push_idol(IdolTag {
                article_id,
                idol_id: idol.id,
                confidence,
            });
            if let Some(group_id) = idol.group_id {
                tags.push_group(GroupTag {
                    article_id,
                    group_id,
                    confidence,
                });
            }
        }

        for group in &self.groups {
            if let Some(confidence) = group.pattern.confidence(text) {
                tags.push_group(GroupTag {
                    article_id,
                    group_id: group.id,
                    confidence,
                });
            }
        }
    }
}

#[cfg(test)]
#[path = "tagger_test.rs"]
mod tests;
