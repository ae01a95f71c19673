//! Resilient client for the prediction service.
//!
//! Every call goes through [`PredictionClient::dispatch`]:
//!
//! ```text
//! breaker.allow? ──no──▶ fresh, then stale cache ──miss──▶ ServiceUnavailable
//!      │yes
//!      ▼
//! fresh cache? ──hit──▶ cached payload
//!      │miss
//!      ▼
//! local quota? ──spent──▶ stale cache ──miss──▶ RateLimited
//!      │ok
//!      ▼
//! network call ──ok──▶ record_success ──▶ typed decode ──ok──▶ cache write, payload
//!      │                                      │mismatch
//!      │                                      ▼
//!      │                               Unknown, stale cache
//!      │failed
//!      ▼
//! record_failure, classify ──▶ stale cache ──miss──▶ classified error
//! ```
//!
//! There are no retries in here and concurrent misses on the same key are not
//! coalesced.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheStore;
use crate::circuit_breaker::CircuitBreaker;
use crate::classifier::{classify, RawFailure};
use crate::config::ClientConfig;
use crate::domain::{HealthStatus, LeagueId, ServiceStatus, SportKey};
use crate::endpoint::{Endpoint, RequestDescriptor};
use crate::error::ServiceError;
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::throttling::RequestQuota;

/// Where a dispatched payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Network,
    FreshCache,
    /// Served past its TTL because the live call was refused or failed.
    StaleCache,
}

impl Origin {
    pub const fn is_cached(self) -> bool {
        !matches!(self, Self::Network)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub data: T,
    pub origin: Origin,
}

pub struct PredictionClient {
    config: ClientConfig,
    http_client: Arc<dyn HttpClient>,
    circuit_breaker: Arc<CircuitBreaker>,
    cache: CacheStore,
    quota: Option<RequestQuota>,
}

impl PredictionClient {
    /// Client with the reqwest transport and fresh breaker/cache state.
    pub fn new(config: ClientConfig) -> Self {
        PredictionClientBuilder::new(config).build()
    }

    pub fn builder(config: ClientConfig) -> PredictionClientBuilder {
        PredictionClientBuilder::new(config)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub async fn get_status(&self) -> Result<ServiceStatus, ServiceError> {
        self.call(&Endpoint::Status).await
    }

    pub async fn get_sports(&self) -> Result<Value, ServiceError> {
        self.call(&Endpoint::Sports).await
    }

    pub async fn get_odds(&self, sport: &SportKey) -> Result<Value, ServiceError> {
        self.call(&Endpoint::Odds(sport.clone())).await
    }

    pub async fn get_live_scores(&self) -> Result<Value, ServiceError> {
        self.call(&Endpoint::LiveScores).await
    }

    pub async fn get_league_fixtures(&self, league: LeagueId) -> Result<Value, ServiceError> {
        self.call(&Endpoint::LeagueFixtures(league)).await
    }

    pub async fn get_teams(&self, league: LeagueId) -> Result<Value, ServiceError> {
        self.call(&Endpoint::Teams(league)).await
    }

    pub async fn get_leagues(&self) -> Result<Value, ServiceError> {
        self.call(&Endpoint::Leagues).await
    }

    /// Asks the service to re-check its upstream integrations in the background.
    pub async fn trigger_status_check(&self) -> Result<Value, ServiceError> {
        self.call(&Endpoint::CheckStatus).await
    }

    /// Like the typed getters, but reports whether the payload was live or cached.
    pub async fn fetch(&self, endpoint: &Endpoint) -> Result<Fetched<Value>, ServiceError> {
        self.dispatch_with_origin(endpoint.descriptor(&self.config))
            .await
    }

    pub fn health(&self) -> HealthStatus {
        let snapshot = self.circuit_breaker.snapshot();
        HealthStatus::from_circuit(
            snapshot.state,
            snapshot.consecutive_failures,
            snapshot.retry_in.map(|wait| wait.as_millis() as u64),
        )
    }

    /// Drops the cached payload for `endpoint`, stale fallback included.
    pub async fn invalidate(&self, endpoint: &Endpoint) -> bool {
        match endpoint.cache_key() {
            Some(key) => self.cache.invalidate(&key).await,
            None => false,
        }
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    pub async fn dispatch<T>(&self, descriptor: RequestDescriptor) -> Result<T, ServiceError>
    where
        T: DeserializeOwned,
    {
        self.dispatch_with_origin(descriptor)
            .await
            .map(|fetched| fetched.data)
    }

    pub async fn dispatch_with_origin<T>(
        &self,
        descriptor: RequestDescriptor,
    ) -> Result<Fetched<T>, ServiceError>
    where
        T: DeserializeOwned,
    {
        if !self.circuit_breaker.allow(descriptor.bypass_breaker) {
            if let Some(fresh) = self.serve_fresh(&descriptor).await {
                return Ok(fresh);
            }
            tracing::warn!(path = %descriptor.path, "circuit open; skipping upstream call");
            return self
                .serve_stale(&descriptor, ServiceError::service_unavailable())
                .await;
        }

        if let Some(fresh) = self.serve_fresh(&descriptor).await {
            return Ok(fresh);
        }

        if !descriptor.bypass_breaker {
            if let Some(quota) = &self.quota {
                if let Err(wait) = quota.try_acquire() {
                    tracing::warn!(
                        path = %descriptor.path,
                        limit_per_minute = quota.limit(),
                        wait_ms = wait.as_millis() as u64,
                        "local request quota exhausted"
                    );
                    return self
                        .serve_stale(&descriptor, ServiceError::rate_limited())
                        .await;
                }
            }
        }

        match self.execute(&descriptor).await {
            Ok(payload) => {
                // The service answered; a payload of an unexpected shape is not an outage.
                self.circuit_breaker.record_success();
                let data = match serde_json::from_value::<T>(payload.clone()) {
                    Ok(data) => data,
                    Err(decode) => {
                        let error = classify(RawFailure::Decode(decode));
                        tracing::warn!(
                            path = %descriptor.path,
                            error = %error,
                            "response does not match the expected shape"
                        );
                        return self.serve_stale(&descriptor, error).await;
                    }
                };
                if let Some(key) = descriptor.cache_key.as_deref() {
                    let ttl = descriptor
                        .cache_ttl
                        .unwrap_or(self.config.cache_policy.fallback);
                    self.cache.set(key, payload, ttl).await;
                }
                Ok(Fetched {
                    data,
                    origin: Origin::Network,
                })
            }
            Err(failure) => {
                self.circuit_breaker.record_failure();
                let error = classify(failure);
                tracing::warn!(
                    path = %descriptor.path,
                    code = error.code(),
                    error = %error,
                    consecutive_failures = self.circuit_breaker.consecutive_failures(),
                    "prediction service call failed"
                );
                self.serve_stale(&descriptor, error).await
            }
        }
    }

    async fn call<T>(&self, endpoint: &Endpoint) -> Result<T, ServiceError>
    where
        T: DeserializeOwned,
    {
        self.dispatch(endpoint.descriptor(&self.config)).await
    }

    /// Performs the HTTP call and parses the body as JSON. Typed decoding is left to the caller.
    async fn execute(&self, descriptor: &RequestDescriptor) -> Result<Value, RawFailure> {
        let timeout = descriptor.timeout;
        let url = format!("{}{}", self.config.base_url, descriptor.path);
        let mut request = HttpRequest::new(descriptor.method, url)
            .with_header("accept", "application/json")
            .with_auth(&self.config.auth)
            .with_timeout_ms(timeout.as_millis() as u64);
        if let Some(body) = &descriptor.body {
            request = request.with_body(body.to_string());
        }

        let response = match tokio::time::timeout(timeout, self.http_client.execute(request)).await
        {
            Err(_) => return Err(RawFailure::Elapsed(timeout)),
            Ok(Err(error)) => return Err(RawFailure::Transport { error, timeout }),
            Ok(Ok(response)) => response,
        };

        if !response.is_success() {
            return Err(RawFailure::Status(response.status));
        }

        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str::<Value>(&response.body).map_err(RawFailure::Decode)
    }

    async fn serve_fresh<T>(&self, descriptor: &RequestDescriptor) -> Option<Fetched<T>>
    where
        T: DeserializeOwned,
    {
        let key = descriptor.cache_key.as_deref()?;
        let Some(payload) = self.cache.get_fresh(key).await else {
            tracing::debug!(key, "cache miss");
            return None;
        };

        match serde_json::from_value::<T>(payload) {
            Ok(data) => {
                tracing::debug!(key, "cache hit");
                Some(Fetched {
                    data,
                    origin: Origin::FreshCache,
                })
            }
            Err(error) => {
                tracing::debug!(key, %error, "cached payload does not decode; refetching");
                None
            }
        }
    }

    async fn serve_stale<T>(
        &self,
        descriptor: &RequestDescriptor,
        error: ServiceError,
    ) -> Result<Fetched<T>, ServiceError>
    where
        T: DeserializeOwned,
    {
        let Some(key) = descriptor.cache_key.as_deref() else {
            return Err(error);
        };
        let Some(payload) = self.cache.get_stale(key).await else {
            return Err(error);
        };

        match serde_json::from_value::<T>(payload) {
            Ok(data) => {
                tracing::warn!(
                    key,
                    code = error.code(),
                    "serving stale cached payload while service is degraded"
                );
                Ok(Fetched {
                    data,
                    origin: Origin::StaleCache,
                })
            }
            Err(decode) => {
                tracing::debug!(key, %decode, "stale payload does not decode");
                Err(error)
            }
        }
    }
}

impl std::fmt::Debug for PredictionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionClient")
            .field("base_url", &self.config.base_url)
            .field("circuit_breaker", &self.circuit_breaker)
            .field("quota", &self.quota)
            .finish_non_exhaustive()
    }
}

/// Builder for [`PredictionClient`] with injectable transport and shared state.
pub struct PredictionClientBuilder {
    config: ClientConfig,
    http_client: Option<Arc<dyn HttpClient>>,
    circuit_breaker: Option<Arc<CircuitBreaker>>,
    cache: Option<CacheStore>,
}

impl PredictionClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            http_client: None,
            circuit_breaker: None,
            cache: None,
        }
    }

    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn with_circuit_breaker(mut self, circuit_breaker: Arc<CircuitBreaker>) -> Self {
        self.circuit_breaker = Some(circuit_breaker);
        self
    }

    pub fn with_cache(mut self, cache: CacheStore) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> PredictionClient {
        let circuit_breaker = self
            .circuit_breaker
            .unwrap_or_else(|| Arc::new(CircuitBreaker::new(self.config.breaker)));
        let quota = self
            .config
            .max_requests_per_minute
            .and_then(RequestQuota::per_minute);

        PredictionClient {
            http_client: self
                .http_client
                .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new())),
            circuit_breaker,
            cache: self.cache.unwrap_or_default(),
            quota,
            config: self.config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit_breaker::{CircuitBreakerConfig, CircuitState};
    use crate::error::ServiceErrorKind;
    use crate::http_client::{HttpError, HttpResponse};
    use serde_json::json;
    use std::collections::VecDeque;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct ScriptedHttpClient {
        responses: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedHttpClient {
        fn with(responses: Vec<Result<HttpResponse, HttpError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.requests.lock().expect("request log").len()
        }

        fn urls(&self) -> Vec<String> {
            self.requests
                .lock()
                .expect("request log")
                .iter()
                .map(|request| request.url.clone())
                .collect()
        }
    }

    impl HttpClient for ScriptedHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.requests.lock().expect("request log").push(request);
            let response = self
                .responses
                .lock()
                .expect("scripted responses")
                .pop_front()
                .unwrap_or_else(|| Err(HttpError::connect("no scripted response")));
            Box::pin(async move { response })
        }
    }

    fn client(http: Arc<ScriptedHttpClient>) -> PredictionClient {
        PredictionClient::builder(ClientConfig::default().with_max_requests_per_minute(None))
            .with_http_client(http)
            .build()
    }

    fn open_breaker(client: &PredictionClient) {
        for _ in 0..client.config().breaker.failure_threshold {
            client.circuit_breaker().record_failure();
        }
        assert_eq!(client.circuit_breaker().state(), CircuitState::Open);
    }

    #[tokio::test]
    async fn success_caches_payload_and_resets_breaker() {
        let http = ScriptedHttpClient::with(vec![Ok(HttpResponse::ok_json(r#"[{"id":39}]"#))]);
        let client = client(http.clone());
        client.circuit_breaker().record_failure();

        let leagues = client.get_leagues().await.expect("leagues");
        assert_eq!(leagues, json!([{"id": 39}]));
        assert_eq!(client.circuit_breaker().consecutive_failures(), 0);
        assert_eq!(client.cache().get_fresh("leagues").await, Some(leagues));
        assert_eq!(http.urls(), vec!["http://localhost:5000/api/leagues"]);
    }

    #[tokio::test]
    async fn fresh_cache_short_circuits_network() {
        let http = ScriptedHttpClient::with(vec![]);
        let client = client(http.clone());
        client
            .cache()
            .set("leagues", json!(["cached"]), Duration::from_secs(86_400))
            .await;

        let fetched = client.fetch(&Endpoint::Leagues).await.expect("cached");
        assert_eq!(fetched.data, json!(["cached"]));
        assert_eq!(fetched.origin, Origin::FreshCache);
        assert_eq!(http.calls(), 0);
    }

    #[tokio::test]
    async fn open_breaker_serves_stale_payload() {
        let http = ScriptedHttpClient::with(vec![]);
        let client = client(http.clone());
        client
            .cache()
            .set("odds_football", json!({"odds": []}), Duration::ZERO)
            .await;
        open_breaker(&client);

        let sport = SportKey::parse("football").expect("valid");
        let fetched = client
            .fetch(&Endpoint::Odds(sport))
            .await
            .expect("stale fallback");
        assert_eq!(fetched.origin, Origin::StaleCache);
        assert_eq!(fetched.data, json!({"odds": []}));
        assert_eq!(http.calls(), 0);
    }

    #[tokio::test]
    async fn open_breaker_serves_fresh_payload_as_fresh() {
        let http = ScriptedHttpClient::with(vec![]);
        let client = client(http.clone());
        client
            .cache()
            .set("leagues", json!([{"id": 39}]), Duration::from_secs(60))
            .await;
        open_breaker(&client);

        let fetched = client.fetch(&Endpoint::Leagues).await.expect("fresh hit");
        assert_eq!(fetched.origin, Origin::FreshCache);
        assert_eq!(http.calls(), 0);
    }

    #[tokio::test]
    async fn open_breaker_without_cache_is_unavailable() {
        let http = ScriptedHttpClient::with(vec![]);
        let client = client(http.clone());
        open_breaker(&client);

        let error = client.get_sports().await.expect_err("no fallback");
        assert_eq!(error.kind(), ServiceErrorKind::ServiceUnavailable);
        assert_eq!(http.calls(), 0);
    }

    #[tokio::test]
    async fn status_check_bypasses_open_breaker() {
        let http = ScriptedHttpClient::with(vec![Ok(HttpResponse::ok_json(
            r#"{"overall":"ok","services":{},"timestamp":"2025-03-01T12:00:00Z"}"#,
        ))]);
        let client = client(http.clone());
        open_breaker(&client);

        let status = client.get_status().await.expect("bypass reaches network");
        assert!(status.is_ok());
        assert_eq!(http.calls(), 1);
    }

    #[tokio::test]
    async fn failure_is_classified_and_counted() {
        let http = ScriptedHttpClient::with(vec![Ok(HttpResponse::new(429, "slow down"))]);
        let client = client(http);

        let error = client.get_live_scores().await.expect_err("429");
        assert_eq!(error.kind(), ServiceErrorKind::RateLimited);
        assert_eq!(client.circuit_breaker().consecutive_failures(), 1);
    }

    #[tokio::test]
    async fn failure_falls_back_to_stale_payload() {
        let http = ScriptedHttpClient::with(vec![Ok(HttpResponse::new(500, ""))]);
        let client = client(http.clone());
        client
            .cache()
            .set("livescore", json!({"live": 1}), Duration::ZERO)
            .await;

        let fetched = client.fetch(&Endpoint::LiveScores).await.expect("stale");
        assert_eq!(fetched.origin, Origin::StaleCache);
        assert_eq!(http.calls(), 1);
        assert_eq!(client.circuit_breaker().consecutive_failures(), 1);
    }

    #[tokio::test]
    async fn timeout_counts_as_failure() {
        struct SlowHttpClient;

        impl HttpClient for SlowHttpClient {
            fn execute<'a>(
                &'a self,
                _request: HttpRequest,
            ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>
            {
                Box::pin(async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(HttpResponse::ok_json("{}"))
                })
            }
        }

        let client = PredictionClient::builder(
            ClientConfig::default()
                .with_request_timeout(Duration::from_millis(20))
                .with_max_requests_per_minute(None),
        )
        .with_http_client(Arc::new(SlowHttpClient))
        .build();

        let error = client.get_sports().await.expect_err("must time out");
        assert_eq!(error.kind(), ServiceErrorKind::Timeout);
        assert_eq!(client.circuit_breaker().consecutive_failures(), 1);
    }

    #[tokio::test]
    async fn undecodable_body_is_a_failure() {
        let http = ScriptedHttpClient::with(vec![Ok(HttpResponse::ok_json("<html>oops</html>"))]);
        let client = client(http);

        let error = client.get_sports().await.expect_err("not json");
        assert_eq!(error.kind(), ServiceErrorKind::Unknown);
        assert_eq!(client.circuit_breaker().consecutive_failures(), 1);
        assert!(client.cache().is_empty().await);
    }

    #[tokio::test]
    async fn unexpected_status_shape_does_not_trip_breaker() {
        let body = r#"{"service":"PuntaIQ API Service","status":"online","apis":{}}"#;
        let responses = (0..5).map(|_| Ok(HttpResponse::ok_json(body))).collect();
        let http = ScriptedHttpClient::with(responses);
        let client = client(http.clone());

        for _ in 0..5 {
            let error = client.get_status().await.expect_err("shape mismatch");
            assert_eq!(error.kind(), ServiceErrorKind::Unknown);
        }

        assert_eq!(client.circuit_breaker().state(), CircuitState::Closed);
        assert_eq!(client.circuit_breaker().consecutive_failures(), 0);
        assert_eq!(http.calls(), 5);
    }

    #[tokio::test]
    async fn custom_post_descriptor_sends_body_and_caches() {
        let http = ScriptedHttpClient::with(vec![Ok(HttpResponse::ok_json(r#"{"home_win":0.61}"#))]);
        let client = client(http.clone());
        let descriptor = RequestDescriptor::post("/api/predict", json!({"fixture": 1035}))
            .with_cache("predict_1035", Duration::from_secs(60));

        let first: Value = client.dispatch(descriptor.clone()).await.expect("live call");
        let second = client
            .dispatch_with_origin::<Value>(descriptor)
            .await
            .expect("cached");

        assert_eq!(first["home_win"], 0.61);
        assert_eq!(second.origin, Origin::FreshCache);
        assert_eq!(http.calls(), 1);
        let request = http.requests.lock().expect("request log")[0].clone();
        assert_eq!(request.method, crate::http_client::HttpMethod::Post);
        assert_eq!(request.body.as_deref(), Some(r#"{"fixture":1035}"#));
    }

    #[tokio::test]
    async fn exhausted_quota_skips_network_without_tripping_breaker() {
        let http = ScriptedHttpClient::with(vec![Ok(HttpResponse::ok_json("[]"))]);
        let client = PredictionClient::builder(
            ClientConfig::default().with_max_requests_per_minute(Some(1)),
        )
        .with_http_client(http.clone())
        .build();

        client.trigger_status_check().await.expect("first call");
        let error = client
            .trigger_status_check()
            .await
            .expect_err("quota spent");

        assert_eq!(error.kind(), ServiceErrorKind::RateLimited);
        assert_eq!(http.calls(), 1);
        assert_eq!(client.circuit_breaker().consecutive_failures(), 0);
    }

    #[tokio::test]
    async fn bearer_key_is_sent() {
        let http = ScriptedHttpClient::with(vec![Ok(HttpResponse::ok_json("[]"))]);
        let config = ClientConfig {
            auth: crate::http_client::HttpAuth::BearerToken(String::from("k")),
            ..ClientConfig::default()
        };
        let client = PredictionClient::builder(config)
            .with_http_client(http.clone())
            .build();

        client.get_sports().await.expect("sports");
        let requests = http.requests.lock().expect("request log");
        assert_eq!(
            requests[0].headers.get("authorization").map(String::as_str),
            Some("Bearer k")
        );
    }

    #[tokio::test]
    async fn health_reflects_breaker() {
        let client = PredictionClient::builder(ClientConfig::default().with_breaker(
            CircuitBreakerConfig {
                failure_threshold: 1,
                reset_timeout: Duration::from_secs(60),
            },
        ))
        .with_http_client(ScriptedHttpClient::with(vec![]))
        .build();

        assert_eq!(client.health().state, crate::domain::HealthState::Healthy);
        client.circuit_breaker().record_failure();
        let health = client.health();
        assert_eq!(health.state, crate::domain::HealthState::Unhealthy);
        assert!(health.retry_in_ms.is_some());
    }

    #[tokio::test]
    async fn invalidate_removes_stale_fallback() {
        let client = client(ScriptedHttpClient::with(vec![]));
        client
            .cache()
            .set("sports", json!([]), Duration::from_secs(60))
            .await;

        assert!(client.invalidate(&Endpoint::Sports).await);
        assert!(!client.invalidate(&Endpoint::Status).await);
        assert!(client.cache().get_stale("sports").await.is_none());
    }
}
