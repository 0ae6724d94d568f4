use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let optional = |var: &str| -> Option<String> { lookup(var).ok().filter(|v| !v.is_empty()) };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_positive_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let value = or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value == 0 {
            return Err(invalid(var, "must be greater than zero".to_string()));
        }
        Ok(value)
    };

    let parse_bool = |var: &str, default: bool| -> Result<bool, ConfigError> {
        match lookup(var) {
            Err(_) => Ok(default),
            Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" | "" => Ok(false),
                other => Err(invalid(var, format!("expected a boolean, got '{other}'"))),
            },
        }
    };

    let database_url = require("DATABASE_URL")?;
    let pipeline_secret = require("KPULSE_PIPELINE_SECRET")?;

    let env = parse_environment(&or_default("KPULSE_ENV", "development"))?;

    let bind_addr = parse_addr("KPULSE_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("KPULSE_LOG_LEVEL", "info");
    let catalog_path = optional("KPULSE_CATALOG_PATH").map(PathBuf::from);

    let db_max_connections = parse_u32("KPULSE_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("KPULSE_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("KPULSE_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let feed_request_timeout_secs = parse_u64("KPULSE_FEED_TIMEOUT_SECS", "10")?;
    let feed_user_agent = or_default(
        "KPULSE_FEED_USER_AGENT",
        "Mozilla/5.0 (compatible; KpopPulse/1.0; +https://kpoppulse.app)",
    );
    let feed_max_retries = parse_u32("KPULSE_FEED_MAX_RETRIES", "0")?;
    let feed_retry_backoff_ms = parse_u64("KPULSE_FEED_RETRY_BACKOFF_MS", "500")?;
    let query_batch_size = parse_positive_usize("KPULSE_QUERY_BATCH_SIZE", "3")?;
    let rotation_window_secs = parse_u64("KPULSE_ROTATION_WINDOW_SECS", "900")?;
    if rotation_window_secs == 0 {
        return Err(invalid(
            "KPULSE_ROTATION_WINDOW_SECS",
            "must be greater than zero".to_string(),
        ));
    }
    let upsert_chunk_size = parse_positive_usize("KPULSE_UPSERT_CHUNK_SIZE", "50")?;

    let model_url = optional("KPULSE_MODEL_URL");
    let model_api_key = optional("KPULSE_MODEL_API_KEY");
    let model_name = or_default("KPULSE_MODEL_NAME", "@cf/meta/llama-3.1-8b-instruct");
    let model_timeout_secs = parse_u64("KPULSE_MODEL_TIMEOUT_SECS", "25")?;
    let scheduler_enabled = parse_bool("KPULSE_SCHEDULER_ENABLED", false)?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        pipeline_secret,
        catalog_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        feed_request_timeout_secs,
        feed_user_agent,
        feed_max_retries,
        feed_retry_backoff_ms,
        query_batch_size,
        rotation_window_secs,
        upsert_chunk_size,
        model_url,
        model_api_key,
        model_name,
        model_timeout_secs,
        scheduler_enabled,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "KPULSE_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
