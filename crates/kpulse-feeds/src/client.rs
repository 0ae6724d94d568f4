//! HTTP feed fetcher.
//!
//! Wraps `reqwest` with a per-request timeout, a browser-like user agent, and
//! back-off on transient failures. [`FeedClient::fetch_feed`] never fails: a
//! broken feed degrades to zero items plus an error string for the run report.

use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Client, Url};

use crate::error::FeedError;
use crate::parse::{parse_feed, FeedItem};
use crate::retry::retry_with_backoff;
use crate::text::host_of;

const FEED_ACCEPT: &str = "application/rss+xml, application/xml, text/xml, */*";

/// Outcome of fetching and parsing one feed.
#[derive(Debug, Clone, Default)]
pub struct FeedFetch {
    pub items: Vec<FeedItem>,
    /// Transport or parse failure, formatted for the run-level error list.
    pub error: Option<String>,
}

/// Client for RSS/Atom endpoints.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: Client,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl FeedClient {
    /// # Errors
    ///
    /// Returns [`FeedError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .map_err(FeedError::client_build)?;

        Ok(Self {
            client,
            max_retries,
            backoff_base_ms,
        })
    }

    /// GET `url` and return the body of a 2xx response.
    ///
    /// # Errors
    ///
    /// - [`FeedError::InvalidUrl`] if `url` does not parse.
    /// - [`FeedError::Http`] on network failure or timeout.
    /// - [`FeedError::UnexpectedStatus`] on a non-2xx response.
    pub async fn fetch_text(&self, url: &str) -> Result<String, FeedError> {
        let parsed = Url::parse(url).map_err(|e| FeedError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let host = parsed.host_str().unwrap_or(url).to_string();

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let request = self
                .client
                .get(parsed.clone())
                .header(ACCEPT, FEED_ACCEPT);
            let host = host.clone();
            async move {
                let response = request.send().await.map_err(|source| FeedError::Http {
                    host: host.clone(),
                    source,
                })?;
                let status = response.status();
                if !status.is_success() {
                    return Err(FeedError::UnexpectedStatus {
                        status: status.as_u16(),
                        host,
                    });
                }
                response
                    .text()
                    .await
                    .map_err(|source| FeedError::Http { host, source })
            }
        })
        .await
    }

    /// Fetch and parse one feed.
    ///
    /// # Errors
    ///
    /// Any [`FeedError`] from [`FeedClient::fetch_text`] or [`parse_feed`].
    pub async fn fetch_items(&self, url: &str) -> Result<Vec<FeedItem>, FeedError> {
        let body = self.fetch_text(url).await?;
        parse_feed(&body, url)
    }

    /// Fetch and parse one feed, folding any failure into [`FeedFetch::error`].
    pub async fn fetch_feed(&self, url: &str) -> FeedFetch {
        match self.fetch_items(url).await {
            Ok(items) => {
                tracing::debug!(feed = %host_of(url), items = items.len(), "feed parsed");
                FeedFetch { items, error: None }
            }
            Err(e) => {
                tracing::warn!(feed = %host_of(url), error = %e, "feed fetch degraded to empty");
                FeedFetch {
                    items: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}
