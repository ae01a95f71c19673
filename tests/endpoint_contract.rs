//! Contract tests for the endpoint table: paths, cache keys and TTLs.

use puntaiq_core::{CachePolicy, HttpAuth, ValidationError};
use puntaiq_tests::*;
use std::time::Duration;

#[test]
fn every_endpoint_maps_to_its_service_path() {
    let cases = [
        (Endpoint::Status, "/api/status"),
        (Endpoint::CheckStatus, "/api/check-api-status"),
        (Endpoint::Sports, "/api/sports"),
        (Endpoint::Odds(sport("soccer_epl")), "/api/odds/soccer_epl"),
        (Endpoint::LiveScores, "/api/livescore"),
        (Endpoint::LeagueFixtures(league(39)), "/api/fixtures/league/39"),
        (Endpoint::Teams(league(140)), "/api/teams/league/140"),
        (Endpoint::Leagues, "/api/leagues"),
    ];

    for (endpoint, path) in cases {
        assert_eq!(endpoint.path(), path);
    }
}

#[test]
fn cache_ttls_follow_the_default_policy() {
    let policy = CachePolicy::default();
    let hour = Duration::from_secs(3600);

    assert_eq!(Endpoint::Sports.cache_ttl(&policy), Some(6 * hour));
    assert_eq!(Endpoint::Odds(sport("football")).cache_ttl(&policy), Some(Duration::from_secs(300)));
    assert_eq!(Endpoint::LiveScores.cache_ttl(&policy), Some(Duration::from_secs(60)));
    assert_eq!(Endpoint::LeagueFixtures(league(39)).cache_ttl(&policy), Some(3 * hour));
    assert_eq!(Endpoint::Teams(league(39)).cache_ttl(&policy), Some(24 * hour));
    assert_eq!(Endpoint::Leagues.cache_ttl(&policy), Some(24 * hour));
    assert_eq!(Endpoint::Status.cache_ttl(&policy), None);
}

#[test]
fn only_the_status_endpoint_bypasses_the_breaker() {
    assert!(Endpoint::Status.bypass_breaker());
    assert!(!Endpoint::CheckStatus.bypass_breaker());
    assert!(!Endpoint::Leagues.bypass_breaker());
}

#[test]
fn path_parameters_are_validated_before_dispatch() {
    assert!(matches!(SportKey::parse(""), Err(ValidationError::EmptySport)));
    assert!(matches!(
        SportKey::parse("foot/ball"),
        Err(ValidationError::SportInvalidChar { ch: '/', .. })
    ));
    assert!(LeagueId::new(0).is_err());
    assert!("abc".parse::<LeagueId>().is_err());
    assert_eq!(SportKey::parse("Football").expect("valid").as_str(), "football");
}

#[tokio::test]
async fn requests_carry_the_configured_base_url_and_credentials() {
    let transport = ScriptedTransport::new(vec![ok("[]")]);
    let mut config = unthrottled_config()
        .with_base_url("http://predict.internal:5000/")
        .expect("valid base url");
    config.auth = HttpAuth::BearerToken(String::from("secret"));
    let client = client_with_config(transport.clone(), config);

    client.get_leagues().await.expect("succeeds");

    let request = transport.last_request().expect("one request");
    assert_eq!(request.url, "http://predict.internal:5000/api/leagues");
    assert_eq!(
        request.headers.get("authorization").map(String::as_str),
        Some("Bearer secret")
    );
}

#[tokio::test]
async fn trigger_status_check_is_not_cached() {
    let transport = ScriptedTransport::new(vec![ok(r#"{"message":"started"}"#), ok("{}")]);
    let client = client_with(transport.clone());

    let first = client.trigger_status_check().await.expect("first");
    client.trigger_status_check().await.expect("second");

    assert_eq!(first["message"], "started");
    assert_eq!(transport.call_count(), 2);
    assert!(transport.requested_urls()[0].ends_with("/api/check-api-status"));
}

#[tokio::test]
async fn empty_success_bodies_decode_as_null() {
    let client = client_with(ScriptedTransport::new(vec![ok("")]));

    let payload = client.get_sports().await.expect("empty body is accepted");

    assert!(payload.is_null());
}
