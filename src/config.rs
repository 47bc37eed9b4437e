//! Tap configuration
//!
//! The config file is a flat JSON object. Required keys are validated up front
//! so that a bad config fails before any network call is made.

use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::types::{BackoffType, JsonObject, JsonValue};
use chrono::{DateTime, NaiveDate};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Keys every config file must carry
pub const REQUIRED_CONFIG_KEYS: [&str; 6] = [
    "starts_at",
    "account_id",
    "refresh_token",
    "client_id",
    "client_secret",
    "user_agent",
];

/// Reddit Ads API host
pub const DEFAULT_API_BASE_URL: &str = "https://ads-api.reddit.com";

/// Reddit OAuth token endpoint
pub const DEFAULT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Days of report history re-read on every run
pub const DEFAULT_CONVERSION_WINDOW: u32 = 14;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
const DEFAULT_MAX_RETRIES: u32 = 4;
const DEFAULT_REQUESTS_PER_SECOND: u32 = 1;

/// Validated tap configuration
#[derive(Clone)]
pub struct TapConfig {
    /// First report day to extract
    pub starts_at: NaiveDate,
    /// Last report day to extract (today when unset)
    pub ends_at: Option<NaiveDate>,
    /// Reddit Ads account id
    pub account_id: String,
    /// OAuth refresh token
    pub refresh_token: String,
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// User-Agent sent on every request
    pub user_agent: String,
    /// Look-back in days for late-attributed conversions
    pub conversion_window: u32,
    /// Base URL of the Ads API
    pub api_base_url: String,
    /// Token endpoint URL
    pub token_url: String,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Request rate ceiling
    pub requests_per_second: u32,
}

impl TapConfig {
    /// Load and validate a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config file: {e}")))?;
        Self::from_json(&content)
    }

    /// Parse and validate a config JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Invalid config JSON: {e}")))?;
        Self::from_value(&value)
    }

    /// Validate an already parsed config document
    pub fn from_value(value: &JsonValue) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::config("Config must be a JSON object"))?;

        for key in REQUIRED_CONFIG_KEYS {
            if !obj.contains_key(key) {
                return Err(Error::missing_field(key));
            }
        }

        let starts_at_raw = required_str(obj, "starts_at")?;
        let starts_at = parse_date(&starts_at_raw).ok_or_else(|| {
            Error::invalid_value(
                "starts_at",
                format!("'{starts_at_raw}' is not an ISO date"),
            )
        })?;

        let ends_at = match optional_str(obj, "ends_at") {
            Some(raw) => Some(parse_date(&raw).ok_or_else(|| {
                Error::invalid_value("ends_at", format!("'{raw}' is not an ISO date"))
            })?),
            None => None,
        };

        let user_agent = optional_str(obj, "user_agent")
            .unwrap_or_else(|| format!("tap-reddit-ads/{}", env!("CARGO_PKG_VERSION")));

        let config = Self {
            starts_at,
            ends_at,
            account_id: required_str(obj, "account_id")?,
            refresh_token: required_str(obj, "refresh_token")?,
            client_id: required_str(obj, "client_id")?,
            client_secret: required_str(obj, "client_secret")?,
            user_agent,
            conversion_window: optional_u64(obj, "conversion_window")?
                .map_or(Ok(DEFAULT_CONVERSION_WINDOW), |v| {
                    u32::try_from(v)
                        .map_err(|_| Error::invalid_value("conversion_window", "out of range"))
                })?,
            api_base_url: optional_str(obj, "api_base_url")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            token_url: optional_str(obj, "token_url")
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            request_timeout: Duration::from_secs(
                optional_u64(obj, "request_timeout")?.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            max_retries: optional_u64(obj, "max_retries")?
                .map_or(DEFAULT_MAX_RETRIES, |v| v.min(u64::from(u32::MAX)) as u32),
            requests_per_second: optional_u64(obj, "requests_per_second")?
                .map_or(DEFAULT_REQUESTS_PER_SECOND, |v| {
                    v.clamp(1, u64::from(u32::MAX)) as u32
                }),
        };

        if let Some(ends_at) = config.ends_at {
            if ends_at < config.starts_at {
                return Err(Error::invalid_value(
                    "ends_at",
                    format!("{ends_at} is before starts_at {}", config.starts_at),
                ));
            }
        }

        Url::parse(&config.api_base_url)
            .map_err(|e| Error::invalid_value("api_base_url", e.to_string()))?;
        Url::parse(&config.token_url)
            .map_err(|e| Error::invalid_value("token_url", e.to_string()))?;

        Ok(config)
    }

    /// URL of an account-scoped endpoint, e.g. `/ads`
    pub fn endpoint_url(&self, endpoint: &str) -> Result<String> {
        let base = Url::parse(&self.api_base_url)?;
        let path = format!(
            "{}/api/v2.0/accounts/{}{}",
            base.path().trim_end_matches('/'),
            self.account_id,
            endpoint
        );
        let mut url = base;
        url.set_path(&path);
        Ok(url.to_string())
    }

    /// HTTP client settings derived from this config
    pub fn http_config(&self) -> HttpClientConfig {
        HttpClientConfig::builder()
            .timeout(self.request_timeout)
            .max_retries(self.max_retries)
            .backoff(
                BackoffType::Exponential,
                Duration::from_secs(2),
                Duration::from_secs(60),
            )
            .rate_limit(RateLimiterConfig::new(self.requests_per_second, 1))
            .user_agent(&self.user_agent)
            .build()
    }
}

impl fmt::Debug for TapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TapConfig")
            .field("starts_at", &self.starts_at)
            .field("ends_at", &self.ends_at)
            .field("account_id", &self.account_id)
            .field("client_id", &self.client_id)
            .field("user_agent", &self.user_agent)
            .field("conversion_window", &self.conversion_window)
            .field("api_base_url", &self.api_base_url)
            .finish_non_exhaustive()
    }
}

/// Parse a date from `YYYY-MM-DD`, an RFC 3339 timestamp, or a
/// `YYYY-MM-DD HH:MM:SS` style value (only the date part is kept)
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    let prefix = raw.split([' ', 'T']).next()?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

fn optional_str(obj: &JsonObject, key: &str) -> Option<String> {
    match obj.get(key)? {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn required_str(obj: &JsonObject, key: &str) -> Result<String> {
    match obj.get(key) {
        None | Some(JsonValue::Null) => Err(Error::missing_field(key)),
        Some(_) => optional_str(obj, key)
            .ok_or_else(|| Error::invalid_value(key, "must be a non-empty string")),
    }
}

fn optional_u64(obj: &JsonObject, key: &str) -> Result<Option<u64>> {
    match obj.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| Error::invalid_value(key, "must be a non-negative integer")),
        Some(JsonValue::String(s)) if s.trim().is_empty() => Ok(None),
        Some(JsonValue::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::invalid_value(key, format!("'{s}' is not an integer"))),
        Some(_) => Err(Error::invalid_value(key, "must be an integer")),
    }
}
