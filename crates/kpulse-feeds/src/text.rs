//! Entity decoding, markup stripping, and truncation for feed text.

use std::borrow::Cow;
use std::sync::LazyLock;

use quick_xml::escape::{resolve_predefined_entity, unescape_with};
use regex::{Captures, Regex};

/// Descriptions are cut to this many characters before storage.
pub const DESCRIPTION_MAX_CHARS: usize = 500;

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z][A-Za-z0-9]{1,31});")
        .expect("valid entity regex")
});

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"));

/// Decode XML/HTML character references.
///
/// Each well-formed reference is decoded on its own, so stray `&` characters
/// and unknown named entities are left as they are instead of failing the
/// whole string.
#[must_use]
pub fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    ENTITY_RE
        .replace_all(input, |caps: &Captures<'_>| {
            let entity = &caps[0];
            unescape_with(entity, |name| {
                resolve_predefined_entity(name).or(match name {
                    "nbsp" => Some(" "),
                    _ => None,
                })
            })
            .map_or_else(|_| entity.to_string(), Cow::into_owned)
        })
        .into_owned()
}

/// Strip HTML tags from a string and normalize whitespace.
#[must_use]
pub fn strip_html(html: &str) -> String {
    let no_tags = TAG_RE.replace_all(html, " ");
    no_tags
        .split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Truncate to at most `max` characters, never splitting a code point.
#[must_use]
pub fn truncate_chars(input: &str, max: usize) -> String {
    match input.char_indices().nth(max) {
        Some((idx, _)) => input[..idx].to_string(),
        None => input.to_string(),
    }
}

/// Hostname of `url` for error messages and source fallbacks; the raw input
/// when it does not parse.
#[must_use]
pub fn host_of(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}
