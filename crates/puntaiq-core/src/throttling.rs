//! Outbound request quota, so the client never hammers the service faster
//! than the configured requests-per-minute.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

#[derive(Clone)]
pub struct RequestQuota {
    limiter: Arc<DirectRateLimiter>,
    clock: DefaultClock,
    per_minute: NonZeroU32,
}

impl RequestQuota {
    /// Returns `None` for a zero limit, which means "unthrottled".
    pub fn per_minute(limit: u32) -> Option<Self> {
        let per_minute = NonZeroU32::new(limit)?;
        Some(Self {
            limiter: Arc::new(RateLimiter::direct(Quota::per_minute(per_minute))),
            clock: DefaultClock::default(),
            per_minute,
        })
    }

    /// Takes one unit of budget, or reports how long until one is available.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        self.limiter
            .check()
            .map_err(|not_until| not_until.wait_time_from(self.clock.now()))
    }

    pub const fn limit(&self) -> u32 {
        self.per_minute.get()
    }
}

impl std::fmt::Debug for RequestQuota {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestQuota")
            .field("per_minute", &self.per_minute)
            .finish_non_exhaustive()
    }
}
