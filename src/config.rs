//! Client configuration
//!
//! Everything is read from `COINWATCH_*` environment variables (a `.env` file is
//! honoured through dotenvy). Parsing goes through a lookup function so tests can
//! feed a map instead of the process environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ClientError;
use crate::jobs::live_update::{PollConfig, RetryPolicy};
use crate::services::push_channel::PushConfig;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080/api";
pub const DEFAULT_PUSH_TOPIC: &str = "/topic/crypto";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL including the `/api` prefix
    pub api_url: String,
    /// Directory holding the persisted `jwt_token` file
    pub token_dir: PathBuf,
    pub http_timeout: Duration,
    pub detail_cache_ttl: Duration,
    pub rows_per_page: usize,
    pub highlight_duration: Duration,
    pub poll: PollConfig,
    /// None when no push URL is configured
    pub push: Option<PushConfig>,
}

impl ClientConfig {
    /// Load `.env` then read the process environment.
    pub fn from_env() -> Result<Self, ClientError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("COINWATCH_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let token_dir = lookup("COINWATCH_TOKEN_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| default_token_dir(lookup("HOME")));

        let retry = RetryPolicy {
            max_attempts: parse_or(&lookup, "COINWATCH_RETRY_MAX", 0u32)?,
            initial_delay: Duration::from_millis(parse_or(&lookup, "COINWATCH_RETRY_DELAY_MS", 1000u64)?),
            multiplier: parse_or(&lookup, "COINWATCH_RETRY_MULTIPLIER", 2.0f64)?,
            max_delay: Duration::from_millis(parse_or(&lookup, "COINWATCH_RETRY_MAX_DELAY_MS", 60_000u64)?),
        };
        if retry.multiplier < 1.0 {
            return Err(ClientError::Config {
                key: "COINWATCH_RETRY_MULTIPLIER".to_string(),
                value: retry.multiplier.to_string(),
            });
        }

        let poll_secs: u64 = parse_or(&lookup, "COINWATCH_POLL_INTERVAL_SECS", 60)?;
        if poll_secs == 0 {
            return Err(ClientError::Config {
                key: "COINWATCH_POLL_INTERVAL_SECS".to_string(),
                value: "0".to_string(),
            });
        }

        let rows_per_page: usize = parse_or(&lookup, "COINWATCH_ROWS_PER_PAGE", 25)?;
        if rows_per_page == 0 {
            return Err(ClientError::Config {
                key: "COINWATCH_ROWS_PER_PAGE".to_string(),
                value: "0".to_string(),
            });
        }

        let push = match lookup("COINWATCH_PUSH_URL").filter(|url| !url.trim().is_empty()) {
            Some(url) => Some(PushConfig {
                ws_url: url,
                topic: lookup("COINWATCH_PUSH_TOPIC").unwrap_or_else(|| DEFAULT_PUSH_TOPIC.to_string()),
                reconnect_delay: Duration::from_secs(parse_or(&lookup, "COINWATCH_PUSH_RECONNECT_SECS", 5u64)?),
            }),
            None => None,
        };

        Ok(Self {
            api_url,
            token_dir,
            http_timeout: Duration::from_secs(parse_or(&lookup, "COINWATCH_HTTP_TIMEOUT_SECS", 10u64)?),
            detail_cache_ttl: Duration::from_secs(parse_or(&lookup, "COINWATCH_DETAIL_CACHE_TTL_SECS", 30u64)?),
            rows_per_page,
            highlight_duration: Duration::from_millis(parse_or(&lookup, "COINWATCH_HIGHLIGHT_MS", 1000u64)?),
            poll: PollConfig {
                interval: Duration::from_secs(poll_secs),
                retry,
            },
            push,
        })
    }
}

fn default_token_dir(home: Option<String>) -> PathBuf {
    match home {
        Some(home) if !home.is_empty() => PathBuf::from(home).join(".coinwatch"),
        _ => PathBuf::from(".coinwatch"),
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ClientError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ClientError::Config {
            key: key.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}
