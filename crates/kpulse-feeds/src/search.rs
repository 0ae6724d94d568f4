//! News-search feed URLs.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

const SEARCH_BASE: &str = "https://news.google.com/rss/search";

/// Build the Korean-locale news search feed URL for `query`.
#[must_use]
pub fn search_feed_url(query: &str) -> String {
    let encoded = utf8_percent_encode(query, NON_ALPHANUMERIC).to_string();
    format!("{SEARCH_BASE}?q={encoded}&hl=ko&gl=KR&ceid=KR:ko")
}
