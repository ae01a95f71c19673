//! Client configuration, read from `PUNTAIQ_*` environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `PUNTAIQ_API_URL` | `http://localhost:5000` |
//! | `PUNTAIQ_API_KEY` | unset (no auth header) |
//! | `PUNTAIQ_TIMEOUT_MS` | `10000` |
//! | `PUNTAIQ_STATUS_TIMEOUT_MS` | `5000` |
//! | `PUNTAIQ_FAILURE_THRESHOLD` | `5` |
//! | `PUNTAIQ_RESET_TIMEOUT_SECS` | `30` (at most `86400`) |
//! | `PUNTAIQ_MAX_REQUESTS_PER_MINUTE` | `60` (`0` disables) |

use std::str::FromStr;
use std::time::Duration;

use crate::circuit_breaker::CircuitBreakerConfig;
use crate::error::ConfigError;
use crate::http_client::HttpAuth;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Upper bound for `PUNTAIQ_RESET_TIMEOUT_SECS`: one day.
pub const MAX_RESET_TIMEOUT_SECS: u64 = 86_400;

/// Cache TTL per endpoint family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub sports: Duration,
    pub odds: Duration,
    pub livescore: Duration,
    pub fixtures: Duration,
    pub teams: Duration,
    pub leagues: Duration,
    /// Used when a descriptor names a cache key without a TTL.
    pub fallback: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        const MINUTE: u64 = 60;
        const HOUR: u64 = 60 * MINUTE;

        Self {
            sports: Duration::from_secs(6 * HOUR),
            odds: Duration::from_secs(5 * MINUTE),
            livescore: Duration::from_secs(MINUTE),
            fixtures: Duration::from_secs(3 * HOUR),
            teams: Duration::from_secs(24 * HOUR),
            leagues: Duration::from_secs(24 * HOUR),
            fallback: Duration::from_secs(5 * MINUTE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Service root without a trailing slash.
    pub base_url: String,
    pub auth: HttpAuth,
    pub request_timeout: Duration,
    pub status_timeout: Duration,
    pub breaker: CircuitBreakerConfig,
    pub cache_policy: CachePolicy,
    pub max_requests_per_minute: Option<u32>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::from(DEFAULT_BASE_URL),
            auth: HttpAuth::None,
            request_timeout: Duration::from_millis(10_000),
            status_timeout: Duration::from_millis(5_000),
            breaker: CircuitBreakerConfig::default(),
            cache_policy: CachePolicy::default(),
            max_requests_per_minute: Some(60),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds a config from an arbitrary variable source; unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = lookup("PUNTAIQ_API_URL") {
            config = config.with_base_url(url)?;
        }

        if let Some(key) = lookup("PUNTAIQ_API_KEY") {
            config.auth = HttpAuth::BearerToken(key.trim().to_owned());
        }

        if let Some(ms) = parse_var::<u64>(&lookup, "PUNTAIQ_TIMEOUT_MS")? {
            config.request_timeout = Duration::from_millis(positive("PUNTAIQ_TIMEOUT_MS", ms)?);
        }

        if let Some(ms) = parse_var::<u64>(&lookup, "PUNTAIQ_STATUS_TIMEOUT_MS")? {
            config.status_timeout =
                Duration::from_millis(positive("PUNTAIQ_STATUS_TIMEOUT_MS", ms)?);
        }

        if let Some(threshold) = parse_var::<u32>(&lookup, "PUNTAIQ_FAILURE_THRESHOLD")? {
            config.breaker.failure_threshold =
                positive("PUNTAIQ_FAILURE_THRESHOLD", u64::from(threshold))? as u32;
        }

        if let Some(secs) = parse_var::<u64>(&lookup, "PUNTAIQ_RESET_TIMEOUT_SECS")? {
            if secs > MAX_RESET_TIMEOUT_SECS {
                return Err(ConfigError::InvalidValue {
                    var: "PUNTAIQ_RESET_TIMEOUT_SECS",
                    value: secs.to_string(),
                    reason: format!("must be at most {MAX_RESET_TIMEOUT_SECS}"),
                });
            }
            config.breaker.reset_timeout = Duration::from_secs(secs);
        }

        if let Some(limit) = parse_var::<u32>(&lookup, "PUNTAIQ_MAX_REQUESTS_PER_MINUTE")? {
            config.max_requests_per_minute = (limit > 0).then_some(limit);
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Result<Self, ConfigError> {
        let base_url = base_url.into();
        let trimmed = base_url.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl { value: base_url });
        }

        self.base_url = trimmed.to_owned();
        Ok(self)
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_breaker(mut self, breaker: CircuitBreakerConfig) -> Self {
        self.breaker = breaker;
        self
    }

    pub fn with_cache_policy(mut self, cache_policy: CachePolicy) -> Self {
        self.cache_policy = cache_policy;
        self
    }

    pub fn with_max_requests_per_minute(mut self, limit: Option<u32>) -> Self {
        self.max_requests_per_minute = limit.filter(|limit| *limit > 0);
        self
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(var)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|error| ConfigError::InvalidValue {
                    var,
                    value: value.clone(),
                    reason: error.to_string(),
                })
        })
        .transpose()
}

fn positive(var: &'static str, value: u64) -> Result<u64, ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            reason: String::from("must be greater than zero"),
        });
    }
    Ok(value)
}
