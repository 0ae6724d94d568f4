use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Shared secret expected as the bearer token on pipeline triggers.
    pub pipeline_secret: String,
    /// Pipeline catalog YAML; `None` uses the built-in catalog.
    pub catalog_path: Option<PathBuf>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub feed_request_timeout_secs: u64,
    pub feed_user_agent: String,
    pub feed_max_retries: u32,
    pub feed_retry_backoff_ms: u64,
    /// Search queries drawn from the rotating pool per collect run.
    pub query_batch_size: usize,
    /// Width of the time bucket that selects the query slice.
    pub rotation_window_secs: u64,
    pub upsert_chunk_size: usize,
    pub model_url: Option<String>,
    pub model_api_key: Option<String>,
    pub model_name: String,
    pub model_timeout_secs: u64,
    pub scheduler_enabled: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("pipeline_secret", &"[redacted]")
            .field("catalog_path", &self.catalog_path)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("feed_request_timeout_secs", &self.feed_request_timeout_secs)
            .field("feed_user_agent", &self.feed_user_agent)
            .field("feed_max_retries", &self.feed_max_retries)
            .field("feed_retry_backoff_ms", &self.feed_retry_backoff_ms)
            .field("query_batch_size", &self.query_batch_size)
            .field("rotation_window_secs", &self.rotation_window_secs)
            .field("upsert_chunk_size", &self.upsert_chunk_size)
            .field("model_url", &self.model_url)
            .field(
                "model_api_key",
                &self.model_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("model_name", &self.model_name)
            .field("model_timeout_secs", &self.model_timeout_secs)
            .field("scheduler_enabled", &self.scheduler_enabled)
            .finish()
    }
}
