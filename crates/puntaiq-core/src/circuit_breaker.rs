//! Consecutive-failure circuit breaker for prediction service calls.
//!
//! ```text
//! Closed ──[failure_threshold consecutive failures]──▶ Open
//!   ▲                                                   │
//!   │                                                   │ reset_timeout elapsed
//!   │                                                   ▼
//!   └────────────────[success]──────────────────── HalfOpen
//!                    [failure] ──────────────────────▶ Open
//! ```
//!
//! Half-open admits every caller that observes it; concurrent callers may
//! each issue a trial call during recovery.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Runtime circuit state for upstream calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }
}

/// Circuit breaker thresholds and timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
struct CircuitInner {
    state: CircuitState,
    consecutive_failures: u32,
    // Only `Some` while the state is `Open`.
    next_retry_at: Option<Instant>,
}

impl Default for CircuitInner {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            next_retry_at: None,
        }
    }
}

/// Point-in-time view of the breaker used for health reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub retry_in: Option<Duration>,
}

/// Thread-safe circuit breaker shared by every call the client makes.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<CircuitInner>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(CircuitInner::default()),
        }
    }

    pub const fn config(&self) -> CircuitBreakerConfig {
        self.config
    }

    /// Decides whether a call may proceed. Bypass calls always proceed.
    pub fn allow(&self, bypass: bool) -> bool {
        self.allow_at(bypass, Instant::now())
    }

    pub fn allow_at(&self, bypass: bool, now: Instant) -> bool {
        if bypass {
            return true;
        }

        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => match inner.next_retry_at {
                Some(retry_at) if now >= retry_at => {
                    inner.state = CircuitState::HalfOpen;
                    inner.next_retry_at = None;
                    tracing::info!(
                        consecutive_failures = inner.consecutive_failures,
                        "circuit half-open, admitting trial call"
                    );
                    true
                }
                _ => false,
            },
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Closed;
                inner.consecutive_failures = 0;
                tracing::info!("circuit closed after successful trial call");
            }
            CircuitState::Closed => inner.consecutive_failures = 0,
            // Bypass calls can succeed while open; recovery still goes through a trial call.
            CircuitState::Open => {}
        }
    }

    pub fn record_failure(&self) {
        self.record_failure_at(Instant::now());
    }

    pub fn record_failure_at(&self, now: Instant) {
        let mut inner = self.lock();
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);

        let trip = match inner.state {
            CircuitState::HalfOpen => true,
            CircuitState::Closed => {
                inner.consecutive_failures >= self.config.failure_threshold.max(1)
            }
            CircuitState::Open => false,
        };

        if trip {
            let previous = inner.state;
            inner.state = CircuitState::Open;
            // A retry point past the clock's range leaves the circuit open with no scheduled trial.
            inner.next_retry_at = now.checked_add(self.config.reset_timeout);
            tracing::warn!(
                from = previous.as_str(),
                consecutive_failures = inner.consecutive_failures,
                reset_timeout_ms = self.config.reset_timeout.as_millis() as u64,
                "circuit opened"
            );
        }
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }

    pub fn next_retry_at(&self) -> Option<Instant> {
        self.lock().next_retry_at
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.lock();
        BreakerSnapshot {
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            retry_in: inner
                .next_retry_at
                .map(|retry_at| retry_at.saturating_duration_since(Instant::now())),
        }
    }

    // Every transition leaves the inner state consistent, so a poisoned lock is safe to reuse.
    fn lock(&self) -> MutexGuard<'_, CircuitInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
