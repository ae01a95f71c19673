//! # PuntaIQ Core
//!
//! Resilient client for the PuntaIQ prediction and odds microservice.
//!
//! The main server never talks to the prediction service directly; every call
//! goes through [`PredictionClient`], which keeps a slow, failing or
//! rate-limited service from cascading into its callers.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | Keyed payload store with fresh and stale lookups |
//! | [`circuit_breaker`] | Closed / open / half-open breaker |
//! | [`classifier`] | Maps raw failures onto [`ServiceErrorKind`] |
//! | [`client`] | Facade and dispatch |
//! | [`config`] | Environment-driven configuration and TTL policy |
//! | [`domain`] | Path parameters and the status report |
//! | [`endpoint`] | Endpoint table and request descriptors |
//! | [`error`] | Error types |
//! | [`http_client`] | Transport abstraction (reqwest in production) |
//! | [`retry`] | Caller-side retry helpers |
//! | [`throttling`] | Outbound request quota |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use puntaiq_core::{ClientConfig, PredictionClient, SportKey};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = PredictionClient::new(ClientConfig::from_env()?);
//!
//!     let odds = client.get_odds(&SportKey::parse("football")?).await?;
//!     println!("{odds}");
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Route handler  │
//! └────────┬────────┘
//!          │ get_odds / get_leagues / ...
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ PredictionClient│────▶│ Circuit Breaker  │
//! │   (dispatch)    │────▶│ Cache Store      │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Error Classifier│◀────│ HTTP Client      │
//! └─────────────────┘     │ (reqwest)        │
//!                         └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Callers get either a payload (live or cached) or a [`ServiceError`]:
//!
//! ```rust
//! use puntaiq_core::{ServiceError, ServiceErrorKind};
//!
//! fn handle_error(error: ServiceError) {
//!     match error.kind() {
//!         ServiceErrorKind::RateLimited => {
//!             // Back off
//!         }
//!         ServiceErrorKind::ServiceUnavailable => {
//!             // Show a degraded banner
//!         }
//!         _ => {}
//!     }
//! }
//! ```

pub mod cache;
pub mod circuit_breaker;
pub mod classifier;
pub mod client;
pub mod config;
pub mod domain;
pub mod endpoint;
pub mod error;
pub mod http_client;
pub mod retry;
pub mod throttling;

// Caching
pub use cache::CacheStore;

// Circuit breaker
pub use circuit_breaker::{BreakerSnapshot, CircuitBreaker, CircuitBreakerConfig, CircuitState};

// Classification
pub use classifier::{classify, RawFailure};

// Client facade
pub use client::{Fetched, Origin, PredictionClient, PredictionClientBuilder};

// Configuration
pub use config::{CachePolicy, ClientConfig};

// Domain models
pub use domain::{
    ComponentStatus, HealthState, HealthStatus, LeagueId, OverallStatus, ServiceStatus, SportKey,
};

// Endpoints
pub use endpoint::{Endpoint, RequestDescriptor};

// Error types
pub use error::{ConfigError, ServiceError, ServiceErrorKind, ValidationError};

// HTTP client types
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpErrorKind, HttpMethod, HttpRequest, HttpResponse,
    ReqwestHttpClient,
};

// Retry logic
pub use retry::{retry, Backoff, RetryConfig};

// Throttling
pub use throttling::RequestQuota;
