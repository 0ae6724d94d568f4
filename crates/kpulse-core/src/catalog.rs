//! Pipeline catalog: feed list, rotating search-query pool, outlet alias
//! table, and the curated set of ambiguous stage names.
//!
//! The built-in catalog mirrors the production lists. Deployments may point
//! `KPULSE_CATALOG_PATH` at a YAML file with the same shape to curate them
//! without a rebuild.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const DIRECT_FEEDS: &[&str] = &[
    "https://www.soompi.com/feed",
    "https://feeds.feedburner.com/allkpop",
    "https://www.koreaboo.com/feed/",
];

const SEARCH_QUERIES: &[&str] = &[
    "BTS 방탄소년단",
    "BLACKPINK 블랙핑크",
    "aespa 에스파",
    "NewJeans 뉴진스",
    "Stray Kids 스트레이키즈",
    "SEVENTEEN 세븐틴",
    "ENHYPEN 엔하이픈",
    "IVE 아이브",
    "LE SSERAFIM 르세라핌",
    "TWICE 트와이스",
    "NCT 127 NCT DREAM",
    "ATEEZ 에이티즈",
    "ITZY 있지 NMIXX",
    "(G)I-DLE 여자아이들",
    "Red Velvet 레드벨벳 EXO",
    "TREASURE 트레저 RIIZE",
    "BOYNEXTDOOR BABYMONSTER",
    "케이팝 컴백 앨범 발매",
    "K-pop 빌보드 차트 아이돌",
];

const SOURCE_ALIASES: &[(&str, &str)] = &[
    ("오센", "OSEN"),
    ("스포츠조선", "Sports Chosun"),
    ("스타뉴스", "Star News"),
    ("뉴스엔", "Newsen"),
    ("헤럴드팝", "Herald Pop"),
    ("엑스포츠뉴스", "Xportsnews"),
    ("MK스포츠", "MK Sports"),
    ("스포티비뉴스", "SPOTV News"),
    ("톱스타뉴스", "Top Star News"),
    ("텐아시아", "Tenasia"),
    ("디스패치", "Dispatch"),
    ("데일리팝", "Daily Pop"),
    ("아이돌이슈", "Idol Issue"),
    ("코리아헤럴드", "K-pop Herald"),
    ("Soompi", "Soompi"),
    ("allkpop", "allkpop"),
    ("Koreaboo", "Koreaboo"),
];

const AMBIGUOUS_NAMES: &[&str] = &[
    "v", "rm", "jin", "han", "jun", "dk", "the8", "i.n", "jay", "rei", "liz", "key", "do", "lay",
    "chen", "joy", "mark", "win", "ten", "leon",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineCatalog {
    /// Feeds fetched on every collect run.
    #[serde(default)]
    pub direct_feeds: Vec<String>,
    /// Rotating pool of news-search queries.
    #[serde(default)]
    pub search_queries: Vec<String>,
    /// Localized or alternate outlet name -> canonical outlet name.
    #[serde(default)]
    pub source_aliases: BTreeMap<String, String>,
    /// Stage names that collide with common words and need whole-word matches.
    #[serde(default)]
    pub ambiguous_names: Vec<String>,
}

impl Default for PipelineCatalog {
    fn default() -> Self {
        Self {
            direct_feeds: DIRECT_FEEDS.iter().map(|s| (*s).to_string()).collect(),
            search_queries: SEARCH_QUERIES.iter().map(|s| (*s).to_string()).collect(),
            source_aliases: SOURCE_ALIASES
                .iter()
                .map(|(alias, canonical)| ((*alias).to_string(), (*canonical).to_string()))
                .collect(),
            ambiguous_names: AMBIGUOUS_NAMES.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl PipelineCatalog {
    /// Lowercased ambiguous-name set, ready for case-insensitive lookup.
    #[must_use]
    pub fn ambiguous_name_set(&self) -> HashSet<String> {
        self.ambiguous_names
            .iter()
            .map(|name| name.trim().to_lowercase())
            .collect()
    }
}

/// Load and validate a pipeline catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_catalog(path: &Path) -> Result<PipelineCatalog, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let catalog: PipelineCatalog = serde_yaml::from_str(&content)?;
    validate_catalog(&catalog)?;
    Ok(catalog)
}

/// Validate catalog invariants.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] when the catalog has no feeds at all,
/// or contains blank feed URLs, queries, aliases, or ambiguous names.
pub fn validate_catalog(catalog: &PipelineCatalog) -> Result<(), ConfigError> {
    if catalog.direct_feeds.is_empty() && catalog.search_queries.is_empty() {
        return Err(ConfigError::Validation(
            "catalog must define at least one direct feed or search query".to_string(),
        ));
    }

    for feed in &catalog.direct_feeds {
        if !feed.starts_with("http://") && !feed.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "direct feed '{feed}' is not an http(s) URL"
            )));
        }
    }

    if catalog.search_queries.iter().any(|q| q.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "search queries must not be blank".to_string(),
        ));
    }

    for (alias, canonical) in &catalog.source_aliases {
        if alias.trim().is_empty() || canonical.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "source alias '{alias}' -> '{canonical}' has a blank side"
            )));
        }
    }

    if catalog.ambiguous_names.iter().any(|n| n.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "ambiguous names must not be blank".to_string(),
        ));
    }

    Ok(())
}
