//! Auth types
//!
//! Credentials come from the tap config; access tokens live only in memory.

use crate::config::TapConfig;
use chrono::{DateTime, Utc};
use std::fmt;

/// Credentials for the OAuth2 refresh-token grant
#[derive(Clone)]
pub struct OAuthCredentials {
    /// Token endpoint URL
    pub token_url: String,
    /// Client ID
    pub client_id: String,
    /// Client secret
    pub client_secret: String,
    /// Refresh token
    pub refresh_token: String,
    /// User-Agent for token requests (Reddit rejects generic agents)
    pub user_agent: String,
}

impl OAuthCredentials {
    /// Build credentials from the tap config
    pub fn from_config(config: &TapConfig) -> Self {
        Self {
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            refresh_token: config.refresh_token.clone(),
            user_agent: config.user_agent.clone(),
        }
    }
}

impl fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

/// Short-lived access token with expiration
#[derive(Clone)]
pub struct AccessToken {
    /// The bearer token value
    pub value: String,
    /// When the token expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Create a new access token
    pub fn new(value: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// Create a token that expires in N seconds from now
    pub fn expires_in(value: impl Into<String>, seconds: i64) -> Self {
        let expires_at = Utc::now() + chrono::Duration::seconds(seconds);
        Self {
            value: value.into(),
            expires_at: Some(expires_at),
        }
    }

    /// Check if the token is expired (with 30 second buffer)
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                let buffer = chrono::Duration::seconds(30);
                Utc::now() + buffer >= expires_at
            }
            None => false, // No expiration = never expires
        }
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
