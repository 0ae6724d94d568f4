//! Lenient RSS 2.0 / Atom item extraction.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::FeedError;
use crate::text::{decode_entities, host_of, strip_html, truncate_chars, DESCRIPTION_MAX_CHARS};

static CDATA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").expect("valid cdata regex"));

/// `<link/>` followed by a bare URL, as emitted by some RSS generators.
static BARE_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<link\s*/>\s*(https?://[^\s<]+)").expect("valid bare link regex")
});

static SOURCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<source\s+[^>]*?url="([^"]*)"[^>]*>(.*?)</source>"#)
        .expect("valid source regex")
});

static ATOM_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<link\b([^>]*)>").expect("valid atom link regex"));

static ATTR_HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href\s*=\s*["']([^"']*)["']"#).expect("valid href regex"));

static ATTR_REL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"rel\s*=\s*["']([^"']*)["']"#).expect("valid rel regex"));

/// One article candidate pulled out of a feed document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    /// Raw publication timestamp text; parsed later on a best-effort basis.
    pub pub_date: String,
    /// Outlet name from RSS `<source>`, empty when the feed does not name one.
    pub source_name: String,
    pub source_url: String,
    /// Plain-text description, at most [`DESCRIPTION_MAX_CHARS`] characters.
    pub description: String,
}

/// Extract items from an RSS or Atom document.
///
/// Both `<item>` and `<entry>` containers are read from the same document,
/// RSS items first. Items without a title or an http(s) link are dropped.
///
/// # Errors
///
/// Returns [`FeedError::NoItems`] when the document has no item or entry
/// containers at all.
pub fn parse_feed(xml: &str, feed_url: &str) -> Result<Vec<FeedItem>, FeedError> {
    let rss_bodies = containers(xml, "item");
    let atom_bodies = containers(xml, "entry");

    if rss_bodies.is_empty() && atom_bodies.is_empty() {
        return Err(FeedError::NoItems {
            host: host_of(feed_url),
        });
    }

    let mut items: Vec<FeedItem> = rss_bodies.into_iter().filter_map(parse_rss_item).collect();
    items.extend(atom_bodies.into_iter().filter_map(parse_atom_entry));
    Ok(items)
}

fn parse_rss_item(body: &str) -> Option<FeedItem> {
    let title = element_text(body, "title").map(|t| decode_entities(t.trim()))?;

    let link = element_text(body, "link")
        .map(|l| decode_entities(l.trim()))
        .filter(|l| !l.is_empty())
        .or_else(|| {
            BARE_LINK_RE
                .captures(body)
                .map(|c| c[1].trim().to_string())
        })?;

    let pub_date = element_text(body, "pubDate")
        .or_else(|| element_text(body, "dc:date"))
        .map(|d| d.trim().to_string())
        .unwrap_or_default();

    let (source_url, source_name) = SOURCE_RE
        .captures(body)
        .map(|c| {
            (
                decode_entities(c[1].trim()),
                decode_entities(unwrap_cdata(c[2].trim()).trim()),
            )
        })
        .unwrap_or_default();

    let description = element_text(body, "description")
        .map(|d| clean_description(&d))
        .unwrap_or_default();

    finish(FeedItem {
        title,
        link,
        pub_date,
        source_name,
        source_url,
        description,
    })
}

fn parse_atom_entry(body: &str) -> Option<FeedItem> {
    let title = element_text(body, "title").map(|t| decode_entities(t.trim()))?;

    let link = atom_link(body)
        .or_else(|| element_text(body, "link").map(|l| l.trim().to_string()))
        .map(|l| decode_entities(&l))?;

    let pub_date = element_text(body, "published")
        .or_else(|| element_text(body, "updated"))
        .map(|d| d.trim().to_string())
        .unwrap_or_default();

    let description = element_text(body, "summary")
        .or_else(|| element_text(body, "content"))
        .map(|d| clean_description(&d))
        .unwrap_or_default();

    finish(FeedItem {
        title,
        link,
        pub_date,
        source_name: String::new(),
        source_url: String::new(),
        description,
    })
}

/// Drop items whose title is blank or whose link is not an absolute http(s) URL.
fn finish(item: FeedItem) -> Option<FeedItem> {
    let has_http_link = item.link.starts_with("http://") || item.link.starts_with("https://");
    (!item.title.is_empty() && has_http_link).then_some(item)
}

fn clean_description(raw: &str) -> String {
    let decoded = decode_entities(&unwrap_cdata(raw));
    truncate_chars(&strip_html(&decoded), DESCRIPTION_MAX_CHARS)
}

/// Pick the entry's alternate link: the first `<link href>` with no `rel` or
/// `rel="alternate"`, otherwise the first `<link href>` of any kind.
fn atom_link(body: &str) -> Option<String> {
    let mut fallback = None;
    for caps in ATOM_LINK_RE.captures_iter(body) {
        let attrs = &caps[1];
        let Some(href) = ATTR_HREF_RE.captures(attrs).map(|c| c[1].trim().to_string()) else {
            continue;
        };
        match ATTR_REL_RE.captures(attrs).map(|c| c[1].to_string()) {
            None => return Some(href),
            Some(rel) if rel == "alternate" => return Some(href),
            Some(_) => {
                fallback.get_or_insert(href);
            }
        }
    }
    fallback
}

/// Return the bodies of every well-terminated `<tag>...</tag>` container.
///
/// Each closing tag is paired with the nearest opening tag before it, so an
/// unterminated container swallows nothing that follows it.
fn containers<'a>(xml: &'a str, tag: &str) -> Vec<&'a str> {
    let close = format!("</{tag}>");
    let mut bodies = Vec::new();
    let mut cursor = 0;

    while let Some(rel_close) = xml[cursor..].find(&close) {
        let close_at = cursor + rel_close;
        if let Some(body_start) = last_open_tag_end(&xml[cursor..close_at], tag) {
            bodies.push(&xml[cursor + body_start..close_at]);
        }
        cursor = close_at + close.len();
    }

    bodies
}

/// Byte offset just past the last `<tag>` / `<tag attr...>` opener in `segment`.
fn last_open_tag_end(segment: &str, tag: &str) -> Option<usize> {
    let open = format!("<{tag}");
    let mut found = None;
    let mut search_from = 0;

    while let Some(rel) = segment[search_from..].find(&open) {
        let start = search_from + rel;
        let after_name = start + open.len();
        search_from = after_name;

        let next = segment[after_name..].chars().next();
        let is_opener = matches!(next, Some('>')) || next.is_some_and(char::is_whitespace);
        if !is_opener {
            continue;
        }
        if let Some(rel_end) = segment[after_name..].find('>') {
            let end = after_name + rel_end;
            if !segment[..end].ends_with('/') {
                found = Some(end + 1);
            }
        }
    }

    found
}

/// Text content of the first non-empty `<tag>` element in `body`, with
/// CDATA sections unwrapped.
fn element_text(body: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let mut search_from = 0;

    while let Some(rel) = body[search_from..].find(&open) {
        let start = search_from + rel;
        let after_name = start + open.len();
        search_from = after_name;

        let next = body[after_name..].chars().next();
        let is_opener = matches!(next, Some('>')) || next.is_some_and(char::is_whitespace);
        if !is_opener {
            continue;
        }
        let open_end = after_name + body[after_name..].find('>')?;
        if body[..open_end].ends_with('/') {
            continue;
        }
        let content_start = open_end + 1;
        let content_end = content_start + body[content_start..].find(&close)?;
        let text = unwrap_cdata(&body[content_start..content_end]);
        if !text.trim().is_empty() {
            return Some(text);
        }
    }

    None
}

fn unwrap_cdata(raw: &str) -> String {
    if raw.contains("<![CDATA[") {
        CDATA_RE.replace_all(raw, "$1").into_owned()
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
