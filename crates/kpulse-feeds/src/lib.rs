//! RSS/Atom feed fetching and lenient item extraction for the kpulse collector.
//!
//! Feeds in the wild are inconsistent, so items are pulled out with pattern
//! matching over `<item>`/`<entry>` containers rather than a validating XML
//! parser: one broken container never costs the rest of the document.

pub mod client;
pub mod error;
pub mod parse;
pub mod search;
pub mod text;

mod retry;

pub use client::{FeedClient, FeedFetch};
pub use error::FeedError;
pub use parse::{parse_feed, FeedItem};
pub use search::search_feed_url;
pub use text::{decode_entities, host_of, strip_html, truncate_chars, DESCRIPTION_MAX_CHARS};
