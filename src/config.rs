use std::{env, path::PathBuf, str::FromStr, time::Duration};
use tracing::warn;

const DEFAULT_API_URL: &str = "http://127.0.0.1:8787";

/// Runtime settings, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub api_base_url: String,
    pub ai_search_url: String,
    pub request_timeout: Duration,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    pub stale_time: Duration,
    pub page_size: usize,
    pub data_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let api_base_url = DEFAULT_API_URL.to_string();
        Self {
            port: 8080,
            ai_search_url: format!("{api_base_url}/api/ai-search"),
            api_base_url,
            request_timeout: Duration::from_secs(30),
            retry_attempts: 3,
            retry_delay: Duration::from_millis(1000),
            stale_time: Duration::from_secs(300),
            page_size: 10,
            data_path: PathBuf::from("data/sessions.json"),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset or unparseable values
    /// fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let api_base_url = lookup("INSIGHTS_API_URL")
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or(defaults.api_base_url);
        let ai_search_url = lookup("AI_SEARCH_URL")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| format!("{api_base_url}/api/ai-search"));

        Self {
            port: parse_or(&lookup, "PORT", defaults.port),
            ai_search_url,
            api_base_url,
            request_timeout: Duration::from_millis(parse_or(
                &lookup,
                "API_TIMEOUT_MS",
                defaults.request_timeout.as_millis() as u64,
            )),
            retry_attempts: parse_or(&lookup, "API_RETRY_ATTEMPTS", defaults.retry_attempts),
            retry_delay: Duration::from_millis(parse_or(
                &lookup,
                "API_RETRY_DELAY_MS",
                defaults.retry_delay.as_millis() as u64,
            )),
            stale_time: Duration::from_secs(parse_or(
                &lookup,
                "QUERY_STALE_SECS",
                defaults.stale_time.as_secs(),
            )),
            page_size: parse_or(&lookup, "PAGE_SIZE", defaults.page_size).max(1),
            data_path: lookup("APP_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
        }
    }
}

fn parse_or<T: FromStr + Copy>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!("ignoring invalid {key}={raw:?}");
                default
            }
        },
        None => default,
    }
}
