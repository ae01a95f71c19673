//! Error types for service calls, path parameters and configuration.

use std::fmt::{Display, Formatter};
use std::time::Duration;

use thiserror::Error;

/// Caller-facing failure category for prediction service calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceErrorKind {
    ServiceUnavailable,
    AuthenticationFailed,
    RateLimited,
    Timeout,
    UpstreamError,
    Unknown,
}

impl ServiceErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ServiceUnavailable => "service_unavailable",
            Self::AuthenticationFailed => "authentication_failed",
            Self::RateLimited => "rate_limited",
            Self::Timeout => "timeout",
            Self::UpstreamError => "upstream_error",
            Self::Unknown => "unknown",
        }
    }
}

impl Display for ServiceErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified error surfaced when neither the live call nor the cache can answer.
#[derive(Debug)]
pub struct ServiceError {
    kind: ServiceErrorKind,
    message: String,
    status: Option<u16>,
    cause: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl ServiceError {
    fn new(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            cause: None,
        }
    }

    pub fn service_unavailable() -> Self {
        Self::new(
            ServiceErrorKind::ServiceUnavailable,
            "Service temporarily unavailable",
        )
    }

    pub fn authentication_failed(status: u16) -> Self {
        Self {
            status: Some(status),
            ..Self::new(
                ServiceErrorKind::AuthenticationFailed,
                "API authentication failed",
            )
        }
    }

    pub fn rate_limited() -> Self {
        Self::new(
            ServiceErrorKind::RateLimited,
            "Rate limit exceeded, try again later",
        )
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            ServiceErrorKind::Timeout,
            format!("Request timed out after {}ms", after.as_millis()),
        )
    }

    pub fn upstream(status: u16) -> Self {
        Self {
            status: Some(status),
            ..Self::new(
                ServiceErrorKind::UpstreamError,
                format!("Upstream service returned status {status}"),
            )
        }
    }

    pub fn unknown(raw: impl Display) -> Self {
        Self::new(ServiceErrorKind::Unknown, format!("Unexpected error: {raw}"))
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub const fn kind(&self) -> ServiceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Upstream HTTP status, when the failure came from a response.
    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    /// Whether a caller-side retry has a chance of succeeding.
    pub const fn retryable(&self) -> bool {
        match self.kind {
            ServiceErrorKind::ServiceUnavailable
            | ServiceErrorKind::RateLimited
            | ServiceErrorKind::Timeout => true,
            ServiceErrorKind::UpstreamError => matches!(self.status, Some(status) if status >= 500),
            ServiceErrorKind::AuthenticationFailed | ServiceErrorKind::Unknown => false,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            ServiceErrorKind::ServiceUnavailable => "service.unavailable",
            ServiceErrorKind::AuthenticationFailed => "service.authentication_failed",
            ServiceErrorKind::RateLimited => "service.rate_limited",
            ServiceErrorKind::Timeout => "service.timeout",
            ServiceErrorKind::UpstreamError => "service.upstream_error",
            ServiceErrorKind::Unknown => "service.unknown",
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

/// Rejected path parameters, caught before anything is dispatched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("sport cannot be empty")]
    EmptySport,
    #[error("sport length {len} exceeds max {max}")]
    SportTooLong { len: usize, max: usize },
    #[error("sport contains invalid character '{ch}' at index {index}")]
    SportInvalidChar { ch: char, index: usize },

    #[error("league id must be a positive integer: '{value}'")]
    InvalidLeagueId { value: String },
}

/// Invalid client configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}': {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("base url must start with http:// or https://: '{value}'")]
    InvalidBaseUrl { value: String },
}
