use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every value has a default; a value that is set but malformed is an error.
#[derive(Debug, Clone)]
pub struct Config {
    // Web server
    pub api_host: String,
    pub port: u16,

    // Archive
    pub wayback_base_url: String,
    pub fetch_concurrency: usize,
    pub index_attempts: u32,
    pub index_backoff: Duration,
    pub index_timeout: Duration,
    pub snapshot_timeout: Duration,
    pub max_captures: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env("PORT", 5174)?,
            wayback_base_url: env::var("WAYBACK_BASE_URL")
                .unwrap_or_else(|_| "https://web.archive.org".to_string()),
            fetch_concurrency: parse_env("FETCH_CONCURRENCY", 5)?,
            index_attempts: parse_env("INDEX_ATTEMPTS", 3)?,
            index_backoff: Duration::from_millis(parse_env("INDEX_BACKOFF_MS", 2000)?),
            index_timeout: Duration::from_secs(parse_env("INDEX_TIMEOUT_SECS", 15)?),
            snapshot_timeout: Duration::from_secs(parse_env("SNAPSHOT_TIMEOUT_SECS", 7)?),
            max_captures: parse_env("MAX_CAPTURES", 100)?,
        };

        if config.fetch_concurrency == 0 {
            anyhow::bail!("FETCH_CONCURRENCY must be at least 1");
        }
        if config.index_attempts == 0 {
            anyhow::bail!("INDEX_ATTEMPTS must be at least 1");
        }

        config.log_settings();
        Ok(config)
    }

    fn log_settings(&self) {
        tracing::info!(
            base_url = self.wayback_base_url.as_str(),
            concurrency = self.fetch_concurrency,
            attempts = self.index_attempts,
            max_captures = self.max_captures,
            "Archive settings loaded"
        );
    }
}

/// Read `key`, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a valid number, got {raw:?}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_var_uses_default() {
        let v: u32 = parse_env("TWEETREWIND_TEST_UNSET_VAR", 42).unwrap();
        assert_eq!(v, 42);
    }

    #[test]
    fn set_var_is_parsed() {
        env::set_var("TWEETREWIND_TEST_SET_VAR", " 9 ");
        let v: usize = parse_env("TWEETREWIND_TEST_SET_VAR", 1).unwrap();
        assert_eq!(v, 9);
    }

    #[test]
    fn malformed_var_is_an_error() {
        env::set_var("TWEETREWIND_TEST_BAD_VAR", "five");
        let err = parse_env::<u16>("TWEETREWIND_TEST_BAD_VAR", 1).unwrap_err();
        assert!(err.to_string().contains("TWEETREWIND_TEST_BAD_VAR"));
    }
}
