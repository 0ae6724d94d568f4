//! Source resolution: collapse noisy outlet names onto source ids.
//!
//! New sources discovered during a run are queued in memory and created in a
//! single bulk write before the articles that reference them are persisted.

use std::collections::{BTreeMap, HashMap};

use kpulse_core::{NewSource, SourceRecord};
use uuid::Uuid;

const DEFAULT_SOURCE_URL: &str = "https://news.google.com";
const DEFAULT_CATEGORY: &str = "news";

/// Host fragment -> outlet name for articles whose feed names no source.
const KNOWN_HOSTS: [(&str, &str); 5] = [
    ("soompi", "Soompi"),
    ("allkpop", "allkpop"),
    ("koreaboo", "Koreaboo"),
    ("naver", "Naver Entertainment"),
    ("chosun", "Sports Chosun"),
];

/// Where an article's source id will come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRef {
    Known(Uuid),
    /// Index into [`SourceResolver::pending`]; resolved after the bulk create.
    Pending(usize),
}

#[derive(Debug)]
pub struct SourceResolver {
    /// Lowercased name or alias -> source, in insertion order for the
    /// substring pass.
    entries: Vec<(String, SourceRef)>,
    exact: HashMap<String, SourceRef>,
    /// Lowercased alias -> canonical name.
    aliases: HashMap<String, String>,
    pending: Vec<NewSource>,
    created: Vec<Option<Uuid>>,
    fallback: Option<Uuid>,
}

impl SourceResolver {
    /// Seed from persisted sources and the alias table. Aliases whose
    /// canonical name is already known resolve to that source directly.
    #[must_use]
    pub fn new(sources: &[SourceRecord], aliases: &BTreeMap<String, String>) -> Self {
        let mut resolver = Self {
            entries: Vec::with_capacity(sources.len() + aliases.len()),
            exact: HashMap::with_capacity(sources.len() + aliases.len()),
            aliases: aliases
                .iter()
                .map(|(alias, canonical)| (alias.trim().to_lowercase(), canonical.trim().to_string()))
                .collect(),
            pending: Vec::new(),
            created: Vec::new(),
            fallback: sources.first().map(|s| s.id),
        };

        for source in sources {
            resolver.insert(&source.name, SourceRef::Known(source.id));
        }
        for (alias, canonical) in aliases {
            if let Some(found) = resolver.exact.get(&canonical.trim().to_lowercase()).copied() {
                resolver.insert(alias, found);
            }
        }

        resolver
    }

    /// Resolve `raw_name` (falling back to the host of `url_hint` when blank).
    ///
    /// Order: alias canonicalisation, exact case-insensitive match, substring
    /// match in either direction, then a queued creation. A queued name is
    /// registered immediately so later items in the run share its entry.
    pub fn resolve(&mut self, raw_name: &str, url_hint: &str) -> SourceRef {
        let name = match raw_name.trim() {
            "" => source_name_from_url(url_hint),
            trimmed => trimmed.to_string(),
        };
        let canonical = self
            .aliases
            .get(&name.to_lowercase())
            .cloned()
            .unwrap_or(name);
        let key = canonical.to_lowercase();

        if let Some(found) = self.exact.get(&key) {
            return *found;
        }

        if let Some((_, found)) = self
            .entries
            .iter()
            .find(|(known, _)| key.contains(known.as_str()) || known.contains(key.as_str()))
        {
            return *found;
        }

        let url = if url_hint.starts_with("http://") || url_hint.starts_with("https://") {
            url_hint.to_string()
        } else {
            DEFAULT_SOURCE_URL.to_string()
        };
        let index = self.pending.len();
        self.pending.push(NewSource {
            name: canonical.clone(),
            url,
            category: DEFAULT_CATEGORY.to_string(),
        });
        self.created.push(None);
        let queued = SourceRef::Pending(index);
        self.insert(&canonical, queued);
        queued
    }

    /// Sources queued for creation, deduplicated by name.
    #[must_use]
    pub fn pending(&self) -> &[NewSource] {
        &self.pending
    }

    /// Record ids returned by the bulk create, matched back by name.
    pub fn apply_created(&mut self, created: &[SourceRecord]) {
        let by_name: HashMap<String, Uuid> = created
            .iter()
            .map(|s| (s.name.to_lowercase(), s.id))
            .collect();
        for (slot, source) in self.created.iter_mut().zip(&self.pending) {
            if let Some(id) = by_name.get(&source.name.to_lowercase()) {
                *slot = Some(*id);
            }
        }
        if self.fallback.is_none() {
            self.fallback = created.first().map(|s| s.id);
        }
    }

    /// Final id for a resolved reference. Pending sources that were never
    /// created fall back to any known source; `None` only when the store
    /// has no sources at all.
    #[must_use]
    pub fn id_for(&self, source: SourceRef) -> Option<Uuid> {
        match source {
            SourceRef::Known(id) => Some(id),
            SourceRef::Pending(index) => self
                .created
                .get(index)
                .copied()
                .flatten()
                .or(self.fallback),
        }
    }

    fn insert(&mut self, name: &str, source: SourceRef) {
        let key = name.trim().to_lowercase();
        if key.is_empty() || self.exact.contains_key(&key) {
            return;
        }
        self.exact.insert(key.clone(), source);
        self.entries.push((key, source));
    }
}

/// Outlet name derived from an article URL when the feed names none.
#[must_use]
pub fn source_name_from_url(url: &str) -> String {
    let Some(host) = reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
    else {
        return "Unknown".to_string();
    };
    let host = host.strip_prefix("www.").unwrap_or(&host);

    KNOWN_HOSTS
        .iter()
        .find(|(needle, _)| host.contains(needle))
        .map_or_else(|| host.to_string(), |(_, name)| (*name).to_string())
}
