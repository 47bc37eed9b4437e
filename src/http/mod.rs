//! HTTP client module
//!
//! Provides the HTTP client with retry, rate limiting, and backoff strategies.
//!
//! # Features
//!
//! - **Automatic Retries**: Bounded retries of 5xx and transport failures
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Rate-limit Responses**: 429 handling honoring `Retry-After`
//! - **Authentication**: Bearer tokens from a `TokenProvider`, refreshed once on 401

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};

#[cfg(test)]
mod tests;
