use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    /// Network, TLS, or timeout failure from the underlying HTTP client.
    #[error("Fetch error ({host}): {source}")]
    Http {
        host: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {host}")]
    UnexpectedStatus { status: u16, host: String },

    /// The body contained no `<item>` or `<entry>` containers.
    #[error("No items in feed from {host}")]
    NoItems { host: String },

    #[error("invalid feed URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl FeedError {
    /// Build client construction failures, which carry no host.
    pub(crate) fn client_build(source: reqwest::Error) -> Self {
        Self::Http {
            host: "client".to_string(),
            source,
        }
    }
}
