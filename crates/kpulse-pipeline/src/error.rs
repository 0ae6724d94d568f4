use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Db(#[from] kpulse_db::DbError),

    #[error(transparent)]
    Config(#[from] kpulse_core::ConfigError),

    #[error(transparent)]
    Feed(#[from] kpulse_feeds::FeedError),

    /// Transport or status failure talking to the language model.
    #[error("model request failed: {0}")]
    Model(String),

    /// No model endpoint is configured, so nothing can be translated.
    #[error("language model is not configured")]
    ModelUnavailable,

    /// Failure reported by a non-Postgres store implementation.
    #[error("store error: {0}")]
    Store(String),
}
