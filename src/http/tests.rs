//! Tests for the HTTP client module

use super::client::parse_retry_after;
use super::*;
use crate::auth::{AccessToken, TokenProvider};
use crate::error::{Error, Result};
use crate::types::BackoffType;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::net::TcpListener;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Hands out `token-N` where N grows with every invalidation
#[derive(Default)]
struct FakeTokenProvider {
    invalidations: AtomicU32,
}

#[async_trait]
impl TokenProvider for FakeTokenProvider {
    async fn current(&self) -> Result<AccessToken> {
        let n = self.invalidations.load(Ordering::SeqCst) + 1;
        Ok(AccessToken::new(format!("token-{n}"), None))
    }

    async fn invalidate(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }
}

fn fast_config() -> HttpClientConfig {
    HttpClientConfig::builder()
        .max_retries(2)
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(10),
            Duration::from_millis(100),
        )
        .no_rate_limit()
        .build()
}

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(300));
    assert_eq!(config.max_retries, 4);
    assert_eq!(config.initial_backoff, Duration::from_secs(2));
    assert_eq!(config.backoff_type, BackoffType::Exponential);
    assert!(config.rate_limit.is_some());
    assert!(config.user_agent.starts_with("tap-reddit-ads/"));
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .timeout(Duration::from_secs(60))
        .max_retries(5)
        .backoff(
            BackoffType::Linear,
            Duration::from_millis(200),
            Duration::from_secs(30),
        )
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(config.max_retries, 5);
    assert_eq!(config.backoff_type, BackoffType::Linear);
    assert_eq!(config.initial_backoff, Duration::from_millis(200));
    assert_eq!(config.max_backoff, Duration::from_secs(30));
    assert_eq!(config.user_agent, "test-agent/1.0");
}

#[test]
fn test_exponential_backoff() {
    let client = HttpClient::with_config(HttpClientConfig::default()).unwrap();
    assert_eq!(client.calculate_backoff(0), Duration::from_secs(2));
    assert_eq!(client.calculate_backoff(1), Duration::from_secs(4));
    assert_eq!(client.calculate_backoff(2), Duration::from_secs(8));
    assert_eq!(client.calculate_backoff(3), Duration::from_secs(16));
    assert_eq!(client.calculate_backoff(10), Duration::from_secs(60));
}

#[test]
fn test_retry_delay_honors_retry_after() {
    let client = HttpClient::with_config(HttpClientConfig::default()).unwrap();

    assert!(client.retry_delay(0, Some(5)) >= Duration::from_secs(5));
    assert_eq!(client.retry_delay(0, None), Duration::from_secs(2));
    // Our own backoff wins when it is longer than the hint
    assert_eq!(client.retry_delay(3, Some(5)), Duration::from_secs(16));
}

#[test]
fn test_parse_retry_after() {
    let now = Utc.with_ymd_and_hms(2021, 9, 20, 12, 0, 0).unwrap();
    assert_eq!(parse_retry_after("5", now), Some(5));
    assert_eq!(parse_retry_after("1.5", now), Some(2));
    assert_eq!(
        parse_retry_after("Mon, 20 Sep 2021 12:00:30 GMT", now),
        Some(30)
    );
    assert_eq!(
        parse_retry_after("Mon, 20 Sep 2021 11:00:00 GMT", now),
        Some(0)
    );
    assert_eq!(parse_retry_after("soon", now), None);
}

#[tokio::test]
async fn test_get_json_with_query_params() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2.0/accounts/abc/reports"))
        .and(query_param("starts_at", "2021-09-20"))
        .and(query_param("ends_at", "2021-09-20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": []
        })))
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config()).unwrap();
    let body = client
        .get_json(
            &format!("{}/api/v2.0/accounts/abc/reports", mock_server.uri()),
            RequestConfig::new()
                .query("starts_at", "2021-09-20")
                .query("ends_at", "2021-09-20"),
        )
        .await
        .unwrap();

    assert_eq!(body["data"], serde_json::json!([]));
}

#[tokio::test]
async fn test_bearer_token_applied() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ads"))
        .and(header("Authorization", "Bearer token-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client =
        HttpClient::with_auth(fast_config(), Arc::new(FakeTokenProvider::default())).unwrap();
    let body = client
        .get_text(&format!("{}/ads", mock_server.uri()), RequestConfig::new())
        .await
        .unwrap();

    assert_eq!(body, "{}");
}

#[tokio::test]
async fn test_401_refreshes_token_once_and_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ads"))
        .and(header("Authorization", "Bearer token-1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ads"))
        .and(header("Authorization", "Bearer token-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = Arc::new(FakeTokenProvider::default());
    let client = HttpClient::with_auth(fast_config(), provider.clone()).unwrap();
    let body = client
        .get_json(&format!("{}/ads", mock_server.uri()), RequestConfig::new())
        .await
        .unwrap();

    assert_eq!(body["data"], serde_json::json!([]));
    assert_eq!(provider.invalidations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_second_consecutive_401_is_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ads"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let provider = Arc::new(FakeTokenProvider::default());
    let client = HttpClient::with_auth(fast_config(), provider.clone()).unwrap();
    let err = client
        .get_text(&format!("{}/ads", mock_server.uri()), RequestConfig::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Auth { .. }));
    assert_eq!(provider.invalidations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_401_without_provider_is_status_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ads"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config()).unwrap();
    let err = client
        .get_text(&format!("{}/ads", mock_server.uri()), RequestConfig::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 401, .. }));
}

#[tokio::test]
async fn test_429_waits_for_retry_after() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reports"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/reports"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config()).unwrap();
    let start = Instant::now();
    client
        .get_text(&format!("{}/reports", mock_server.uri()), RequestConfig::new())
        .await
        .unwrap();

    assert!(start.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn test_429_exhausts_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reports"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config()).unwrap();
    let err = client
        .get_text(&format!("{}/reports", mock_server.uri()), RequestConfig::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::RateLimited {
            retry_after_seconds: 0
        }
    ));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_retry_on_500() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/campaigns"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/campaigns"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config()).unwrap();
    let body = client
        .get_json(
            &format!("{}/campaigns", mock_server.uri()),
            RequestConfig::new(),
        )
        .await
        .unwrap();

    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_persistent_500_is_fatal_after_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/campaigns"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config()).unwrap();
    let err = client
        .get_text(&format!("{}/campaigns", mock_server.uri()), RequestConfig::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 503, .. }));
}

#[tokio::test]
async fn test_404_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config()).unwrap();
    let err = client
        .get_text(&format!("{}/missing", mock_server.uri()), RequestConfig::new())
        .await
        .unwrap_err();

    match err {
        Error::HttpStatus { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "Not found");
        }
        other => panic!("expected HttpStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_body_is_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ads"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config()).unwrap();
    let err = client
        .get_json(&format!("{}/ads", mock_server.uri()), RequestConfig::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Decode { .. }));
}

#[test]
fn test_request_query_keeps_order_and_replaces_keys() {
    let request = RequestConfig::new()
        .query("starts_at", "2021-09-20")
        .query("cursor", "a")
        .query("cursor", "b");

    assert_eq!(
        request.query,
        vec![
            ("starts_at".to_string(), "2021-09-20".to_string()),
            ("cursor".to_string(), "b".to_string()),
        ]
    );
}

/// Accepts connections and closes them before answering
async fn hang_up_server() -> (String, Arc<AtomicU32>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicU32::new(0));

    let counter = accepted.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            drop(socket);
        }
    });

    (format!("http://{addr}/ads"), accepted)
}

#[tokio::test]
async fn test_dropped_connection_is_retried() {
    let (url, accepted) = hang_up_server().await;

    let client = HttpClient::with_config(fast_config()).unwrap();
    let err = client
        .get_text(&url, RequestConfig::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Http(_)));
    assert!(err.is_retryable());
    assert_eq!(accepted.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_dropped_connection_then_success() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let (first, _) = listener.accept().await.unwrap();
        drop(first);

        let (mut second, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 1024];
        let _ = second.read(&mut buf).await;
        let body = r#"{"data": []}"#;
        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        second.write_all(response.as_bytes()).await.unwrap();
        second.shutdown().await.unwrap();
    });

    let client = HttpClient::with_config(fast_config()).unwrap();
    let body = client
        .get_json(&format!("http://{addr}/ads"), RequestConfig::new())
        .await
        .unwrap();

    assert_eq!(body["data"], serde_json::json!([]));
}
