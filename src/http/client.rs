//! Ads API HTTP client
//!
//! Every GET goes through the same pipeline: pace with the rate limiter,
//! attach the bearer token, send, then decide what the response means.
//! A 401 invalidates the token and is retried exactly once. 429 waits for
//! the server's `Retry-After` hint, and transient failures back off until
//! `max_retries` is used up.

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::auth::TokenProvider;
use crate::error::{Error, Result};
use crate::types::BackoffType;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Retries after the first attempt; 401 refreshes don't count
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Upper bound for any backoff delay
    pub max_backoff: Duration,
    /// How the delay grows between retries
    pub backoff_type: BackoffType,
    /// `None` sends requests unpaced
    pub rate_limit: Option<RateLimiterConfig>,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            max_retries: 4,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(60),
            backoff_type: BackoffType::Exponential,
            rate_limit: Some(RateLimiterConfig::default()),
            user_agent: format!("tap-reddit-ads/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set backoff strategy and bounds
    pub fn backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.config.backoff_type = backoff_type;
        self.config.initial_backoff = initial;
        self.config.max_backoff = max;
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Disable rate limiting
    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Per-request query string, sent in insertion order
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    pub query: Vec<(String, String)>,
}

impl RequestConfig {
    /// Create an empty request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a query parameter, replacing an earlier one with the same key
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        self.query.retain(|(k, _)| *k != key);
        self.query.push((key, value.into()));
        self
    }
}

/// What to do after one attempt
enum Verdict {
    Done(String),
    RefreshToken,
    Retry(Duration),
    Fail(Error),
}

/// HTTP client with retry and rate limiting
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    token_provider: Option<Arc<dyn TokenProvider>>,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Unauthenticated client
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;
        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            token_provider: None,
            rate_limiter,
        })
    }

    /// Client that sends `Authorization: Bearer` from `provider`
    pub fn with_auth(config: HttpClientConfig, provider: Arc<dyn TokenProvider>) -> Result<Self> {
        let mut client = Self::with_config(config)?;
        client.token_provider = Some(provider);
        Ok(client)
    }

    /// GET with retries; only a fully read 2xx body comes back as `Ok`
    pub async fn get_text(&self, url: &str, request: RequestConfig) -> Result<String> {
        let mut attempt = 0;
        let mut refreshed = false;

        loop {
            match self.attempt(url, &request, attempt, refreshed).await? {
                Verdict::Done(body) => {
                    debug!("GET {url} succeeded ({} bytes)", body.len());
                    return Ok(body);
                }
                Verdict::RefreshToken => {
                    warn!("Received 401 for {url}, refreshing access token");
                    if let Some(provider) = &self.token_provider {
                        provider.invalidate().await;
                    }
                    refreshed = true;
                }
                Verdict::Retry(delay) => {
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    refreshed = false;
                }
                Verdict::Fail(e) => return Err(e),
            }
        }
    }

    /// GET and parse the body as JSON
    pub async fn get_json(&self, url: &str, request: RequestConfig) -> Result<Value> {
        let body = self.get_text(url, request).await?;
        serde_json::from_str(&body)
            .map_err(|e| Error::decode(format!("Response from {url} is not JSON: {e}")))
    }

    async fn attempt(
        &self,
        url: &str,
        request: &RequestConfig,
        attempt: u32,
        refreshed: bool,
    ) -> Result<Verdict> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.wait().await;
        }

        let mut req = self.client.get(url);
        if !request.query.is_empty() {
            req = req.query(&request.query);
        }
        if let Some(provider) = &self.token_provider {
            req = req.bearer_auth(provider.current().await?.value);
        }

        let retries_left = attempt < self.config.max_retries;
        let tries = self.config.max_retries + 1;

        let response = match req.send().await {
            Ok(response) => response,
            Err(e) => return Ok(self.transport_failure(e, attempt)),
        };

        let status = response.status();
        if status.is_success() {
            return Ok(match response.text().await {
                Ok(body) => Verdict::Done(body),
                Err(e) => self.transport_failure(e, attempt),
            });
        }

        if status == StatusCode::UNAUTHORIZED && self.token_provider.is_some() {
            if !refreshed {
                return Ok(Verdict::RefreshToken);
            }
            let body = response.text().await.unwrap_or_default();
            return Ok(Verdict::Fail(Error::auth(format!(
                "Request still unauthorized after token refresh: {body}"
            ))));
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = extract_retry_after(&response);
            if retries_left {
                let delay = self.retry_delay(attempt, retry_after);
                warn!("Rate limited (429), attempt {}/{tries}, waiting {delay:?}", attempt + 1);
                return Ok(Verdict::Retry(delay));
            }
            return Ok(Verdict::Fail(Error::RateLimited {
                retry_after_seconds: retry_after
                    .unwrap_or_else(|| self.calculate_backoff(attempt).as_secs()),
            }));
        }

        if status.is_server_error() && retries_left {
            let delay = self.calculate_backoff(attempt);
            warn!(
                "Request failed with {}, attempt {}/{tries}, retrying in {delay:?}",
                status.as_u16(),
                attempt + 1
            );
            return Ok(Verdict::Retry(delay));
        }

        let body = response.text().await.unwrap_or_default();
        Ok(Verdict::Fail(Error::http_status(status.as_u16(), body)))
    }

    /// Send or body-read failure: retried like a 5xx while retries remain
    fn transport_failure(&self, error: reqwest::Error, attempt: u32) -> Verdict {
        let tries = self.config.max_retries + 1;
        if attempt < self.config.max_retries {
            let delay = self.calculate_backoff(attempt);
            warn!(
                "Transport error ({error}), attempt {}/{tries}, retrying in {delay:?}",
                attempt + 1
            );
            return Verdict::Retry(delay);
        }
        if error.is_timeout() {
            return Verdict::Fail(Error::Timeout {
                timeout_ms: self.config.timeout.as_millis() as u64,
            });
        }
        Verdict::Fail(Error::Http(error))
    }

    /// Backoff before retry number `attempt + 1`, capped at `max_backoff`
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let initial = self.config.initial_backoff;
        let delay = match self.config.backoff_type {
            BackoffType::Constant => initial,
            BackoffType::Linear => initial.saturating_mul(attempt + 1),
            BackoffType::Exponential => initial.saturating_mul(2u32.saturating_pow(attempt)),
        };
        delay.min(self.config.max_backoff)
    }

    /// The longer of our backoff and the server's `Retry-After`
    pub fn retry_delay(&self, attempt: u32, retry_after_seconds: Option<u64>) -> Duration {
        let backoff = self.calculate_backoff(attempt);
        retry_after_seconds.map_or(backoff, |secs| backoff.max(Duration::from_secs(secs)))
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("authenticated", &self.token_provider.is_some())
            .finish_non_exhaustive()
    }
}

fn extract_retry_after(response: &Response) -> Option<u64> {
    let raw = response.headers().get("retry-after")?.to_str().ok()?.trim();
    parse_retry_after(raw, Utc::now())
}

/// `Retry-After` as delta-seconds (fractions round up) or an HTTP-date
pub(crate) fn parse_retry_after(raw: &str, now: DateTime<Utc>) -> Option<u64> {
    if let Ok(secs) = raw.parse::<u64>() {
        return Some(secs);
    }
    if let Ok(secs) = raw.parse::<f64>() {
        if secs.is_finite() && secs >= 0.0 {
            return Some(secs.ceil() as u64);
        }
    }
    let at = DateTime::parse_from_rfc2822(raw).ok()?.with_timezone(&Utc);
    Some((at - now).num_seconds().max(0) as u64)
}
