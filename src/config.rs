use std::env;
use std::time::Duration;

use crate::error::ConfigError;

/// Process configuration, built once at startup and passed to every component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `{url}:{port}{root_path}` of the upstream API.
    pub base_api_url: String,
    pub poll_interval: Duration,
    pub server_port: u16,
    pub request_timeout: Duration,
    pub upstream_requests_per_minute: u32,
    /// If true, run a single cycle and exit (no polling loop)
    pub run_once: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |name: &'static str, default: &str| -> Result<String, ConfigError> {
            match lookup(name) {
                Some(v) if v.trim().is_empty() => Err(ConfigError::Empty { name }),
                Some(v) => Ok(v.trim().to_string()),
                None => Ok(default.to_string()),
            }
        };

        let api_url = text("RTC_API_URL", "http://localhost")?;
        let api_port: u16 = parse(&lookup, "RTC_API_PORT", 3000)?;
        let api_root_path = text("RTC_API_ROOT_PATH", "/api")?;

        let poll_interval_ms: u64 = parse(&lookup, "POLL_INTERVAL_MS", 1000)?;
        let timeout_secs: u64 = parse(&lookup, "REQUEST_TIMEOUT_SECONDS", 10)?;
        let upstream_requests_per_minute: u32 = parse(&lookup, "UPSTREAM_REQUESTS_PER_MINUTE", 600)?;
        if upstream_requests_per_minute == 0 {
            return Err(ConfigError::InvalidValue {
                name: "UPSTREAM_REQUESTS_PER_MINUTE",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            base_api_url: format!("{}:{}{}", api_url, api_port, api_root_path),
            poll_interval: Duration::from_millis(poll_interval_ms),
            server_port: parse(&lookup, "SERVER_PORT", 4000)?,
            request_timeout: Duration::from_secs(timeout_secs),
            upstream_requests_per_minute,
            run_once: lookup("RUN_ONCE")
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }

    pub fn odds_url(&self) -> String {
        format!("{}/state", self.base_api_url)
    }

    pub fn mappings_url(&self) -> String {
        format!("{}/mappings", self.base_api_url)
    }
}

fn parse<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|_| ConfigError::InvalidValue { name, value: v }),
    }
}
