//! Token provider implementation
//!
//! Exchanges the refresh token for access tokens and caches the result.

use super::types::{AccessToken, OAuthCredentials};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use serde::Deserialize;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Source of bearer tokens for API requests
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a valid access token, fetching one if none is cached or the
    /// cached one has expired
    async fn current(&self) -> Result<AccessToken>;

    /// Drop the cached token so the next `current()` fetches a fresh one
    async fn invalidate(&self);
}

/// OAuth2 refresh-token grant against the Reddit token endpoint
pub struct RefreshTokenProvider {
    credentials: OAuthCredentials,
    /// Reddit may rotate the refresh token on exchange
    refresh_token: RwLock<String>,
    cached_token: Arc<RwLock<Option<AccessToken>>>,
    http_client: Client,
    exchanges: AtomicU32,
}

impl RefreshTokenProvider {
    /// Create a provider with its own HTTP client
    pub fn new(credentials: OAuthCredentials) -> Self {
        Self::with_client(credentials, Client::new())
    }

    /// Create a provider with a custom HTTP client
    pub fn with_client(credentials: OAuthCredentials, http_client: Client) -> Self {
        let refresh_token = RwLock::new(credentials.refresh_token.clone());
        Self {
            credentials,
            refresh_token,
            cached_token: Arc::new(RwLock::new(None)),
            http_client,
            exchanges: AtomicU32::new(0),
        }
    }

    /// Number of token exchanges performed so far
    pub fn exchange_count(&self) -> u32 {
        self.exchanges.load(Ordering::Relaxed)
    }

    /// Refresh token currently in use
    pub async fn refresh_token(&self) -> String {
        self.refresh_token.read().await.clone()
    }

    /// Exchange the refresh token for a new access token
    async fn fetch_new_token(&self) -> Result<AccessToken> {
        let refresh_token = self.refresh_token.read().await.clone();
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
        ];

        debug!("Requesting access token from {}", self.credentials.token_url);
        self.exchanges.fetch_add(1, Ordering::Relaxed);

        let response = self
            .http_client
            .post(&self.credentials.token_url)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .header(USER_AGENT, &self.credentials.user_agent)
            .form(&form)
            .send()
            .await
            .map_err(Error::Http)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::TokenRefresh {
                message: format!("Refresh token request failed with status {status}: {body}"),
            });
        }

        let token_response: TokenResponse = response.json().await.map_err(Error::Http)?;

        // Reddit answers a rejected grant with 200 and an error payload
        if let Some(error) = token_response.error {
            return Err(Error::auth(format!(
                "Identity provider rejected the refresh token: {error}"
            )));
        }
        let access_token = token_response
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::auth("Token response did not contain an access_token"))?;

        if let Some(rotated) = token_response.refresh_token.filter(|t| !t.is_empty()) {
            if rotated != refresh_token {
                debug!("Refresh token was rotated by the identity provider");
                *self.refresh_token.write().await = rotated;
            }
        }

        info!("Obtained new access token");
        Ok(match token_response.expires_in {
            Some(secs) => AccessToken::expires_in(access_token, secs),
            None => AccessToken::new(access_token, None),
        })
    }
}

#[async_trait]
impl TokenProvider for RefreshTokenProvider {
    async fn current(&self) -> Result<AccessToken> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.is_expired() {
                    return Ok(token.clone());
                }
            }
        }

        let mut cached = self.cached_token.write().await;

        // Double-check after acquiring write lock
        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.clone());
            }
        }

        let new_token = self.fetch_new_token().await?;
        *cached = Some(new_token.clone());
        Ok(new_token)
    }

    async fn invalidate(&self) {
        let mut cached = self.cached_token.write().await;
        *cached = None;
    }
}

impl std::fmt::Debug for RefreshTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshTokenProvider")
            .field("credentials", &self.credentials)
            .field("exchanges", &self.exchange_count())
            .finish_non_exhaustive()
    }
}

/// OAuth2 token response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}
