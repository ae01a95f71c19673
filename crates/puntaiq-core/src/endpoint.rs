//! Prediction service endpoints and the per-call request descriptor.
//!
//! Caching and breaker policy live here as data so every endpoint goes
//! through the same dispatch path.
//!
//! | Endpoint | Path | Cache key | TTL | Bypass |
//! |----------|------|-----------|-----|--------|
//! | [`Endpoint::Status`] | `/api/status` | - | - | yes |
//! | [`Endpoint::CheckStatus`] | `/api/check-api-status` | - | - | no |
//! | [`Endpoint::Sports`] | `/api/sports` | `sports` | 6h | no |
//! | [`Endpoint::Odds`] | `/api/odds/{sport}` | `odds_{sport}` | 5m | no |
//! | [`Endpoint::LiveScores`] | `/api/livescore` | `livescore` | 1m | no |
//! | [`Endpoint::LeagueFixtures`] | `/api/fixtures/league/{id}` | `fixtures_{id}` | 3h | no |
//! | [`Endpoint::Teams`] | `/api/teams/league/{id}` | `teams_{id}` | 24h | no |
//! | [`Endpoint::Leagues`] | `/api/leagues` | `leagues` | 24h | no |

use std::fmt::{Display, Formatter};
use std::time::Duration;

use serde_json::Value;

use crate::config::{CachePolicy, ClientConfig};
use crate::domain::{LeagueId, SportKey};
use crate::http_client::HttpMethod;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Status,
    CheckStatus,
    Sports,
    Odds(SportKey),
    LiveScores,
    LeagueFixtures(LeagueId),
    Teams(LeagueId),
    Leagues,
}

impl Endpoint {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::CheckStatus => "check_status",
            Self::Sports => "sports",
            Self::Odds(_) => "odds",
            Self::LiveScores => "livescore",
            Self::LeagueFixtures(_) => "fixtures",
            Self::Teams(_) => "teams",
            Self::Leagues => "leagues",
        }
    }

    pub fn path(&self) -> String {
        match self {
            Self::Status => String::from("/api/status"),
            Self::CheckStatus => String::from("/api/check-api-status"),
            Self::Sports => String::from("/api/sports"),
            Self::Odds(sport) => format!("/api/odds/{}", urlencoding::encode(sport.as_str())),
            Self::LiveScores => String::from("/api/livescore"),
            Self::LeagueFixtures(league) => format!("/api/fixtures/league/{league}"),
            Self::Teams(league) => format!("/api/teams/league/{league}"),
            Self::Leagues => String::from("/api/leagues"),
        }
    }

    pub fn cache_key(&self) -> Option<String> {
        match self {
            Self::Status | Self::CheckStatus => None,
            Self::Sports => Some(String::from("sports")),
            Self::Odds(sport) => Some(format!("odds_{sport}")),
            Self::LiveScores => Some(String::from("livescore")),
            Self::LeagueFixtures(league) => Some(format!("fixtures_{league}")),
            Self::Teams(league) => Some(format!("teams_{league}")),
            Self::Leagues => Some(String::from("leagues")),
        }
    }

    pub fn cache_ttl(&self, policy: &CachePolicy) -> Option<Duration> {
        match self {
            Self::Status | Self::CheckStatus => None,
            Self::Sports => Some(policy.sports),
            Self::Odds(_) => Some(policy.odds),
            Self::LiveScores => Some(policy.livescore),
            Self::LeagueFixtures(_) => Some(policy.fixtures),
            Self::Teams(_) => Some(policy.teams),
            Self::Leagues => Some(policy.leagues),
        }
    }

    /// Health checks must be able to probe a service the breaker considers dead.
    pub const fn bypass_breaker(&self) -> bool {
        matches!(self, Self::Status)
    }

    pub fn descriptor(&self, config: &ClientConfig) -> RequestDescriptor {
        let timeout = match self {
            Self::Status => config.status_timeout,
            _ => config.request_timeout,
        };

        let mut descriptor = RequestDescriptor::get(self.path()).with_timeout(timeout);
        if let Some(key) = self.cache_key() {
            descriptor = descriptor.with_cache_key(key);
        }
        if let Some(ttl) = self.cache_ttl(&config.cache_policy) {
            descriptor = descriptor.with_cache_ttl(ttl);
        }
        if self.bypass_breaker() {
            descriptor = descriptor.bypassing_breaker();
        }
        descriptor
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}

/// Everything dispatch needs to know about one outbound call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    /// Path relative to the configured base URL, starting with `/`.
    pub path: String,
    pub body: Option<Value>,
    pub timeout: Duration,
    pub cache_key: Option<String>,
    pub cache_ttl: Option<Duration>,
    pub bypass_breaker: bool,
}

impl RequestDescriptor {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            timeout: Duration::from_millis(10_000),
            cache_key: None,
            cache_ttl: None,
            bypass_breaker: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Post, path).with_body(body)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    pub fn with_cache(self, key: impl Into<String>, ttl: Duration) -> Self {
        self.with_cache_key(key).with_cache_ttl(ttl)
    }

    pub fn bypassing_breaker(mut self) -> Self {
        self.bypass_breaker = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_bypasses_breaker_without_cache() {
        let config = ClientConfig::default();
        let descriptor = Endpoint::Status.descriptor(&config);

        assert_eq!(descriptor.path, "/api/status");
        assert!(descriptor.bypass_breaker);
        assert_eq!(descriptor.cache_key, None);
        assert_eq!(descriptor.cache_ttl, None);
        assert_eq!(descriptor.timeout, config.status_timeout);
    }

    #[test]
    fn odds_descriptor_uses_sport_in_path_and_key() {
        let config = ClientConfig::default();
        let sport = SportKey::parse("football").expect("valid sport");
        let descriptor = Endpoint::Odds(sport).descriptor(&config);

        assert_eq!(descriptor.path, "/api/odds/football");
        assert_eq!(descriptor.cache_key.as_deref(), Some("odds_football"));
        assert_eq!(descriptor.cache_ttl, Some(Duration::from_secs(300)));
        assert!(!descriptor.bypass_breaker);
    }

    #[test]
    fn league_scoped_endpoints_key_by_league() {
        let config = ClientConfig::default();
        let league = LeagueId::new(39).expect("valid league");

        let fixtures = Endpoint::LeagueFixtures(league).descriptor(&config);
        assert_eq!(fixtures.path, "/api/fixtures/league/39");
        assert_eq!(fixtures.cache_key.as_deref(), Some("fixtures_39"));

        let teams = Endpoint::Teams(league).descriptor(&config);
        assert_eq!(teams.path, "/api/teams/league/39");
        assert_eq!(teams.cache_key.as_deref(), Some("teams_39"));
        assert_eq!(teams.cache_ttl, Some(Duration::from_secs(86_400)));
    }

    #[test]
    fn ttl_tiers_follow_data_volatility() {
        let policy = CachePolicy::default();
        let live = Endpoint::LiveScores.cache_ttl(&policy).expect("cached");
        let odds = Endpoint::Odds(SportKey::parse("nba").expect("valid"))
            .cache_ttl(&policy)
            .expect("cached");
        let leagues = Endpoint::Leagues.cache_ttl(&policy).expect("cached");

        assert!(live < odds);
        assert!(odds < leagues);
        assert_eq!(leagues, Duration::from_secs(86_400));
    }

    #[test]
    fn check_status_is_uncached_but_breaker_guarded() {
        let descriptor = Endpoint::CheckStatus.descriptor(&ClientConfig::default());
        assert_eq!(descriptor.cache_key, None);
        assert!(!descriptor.bypass_breaker);
    }
}
