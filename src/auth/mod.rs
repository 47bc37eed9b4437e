//! Authentication module
//!
//! Reddit issues short-lived bearer tokens in exchange for a long-lived
//! refresh token. The `TokenProvider` trait is the seam the HTTP client
//! talks to; `RefreshTokenProvider` is the production implementation and
//! tests inject their own.

mod provider;
mod types;

pub use provider::{RefreshTokenProvider, TokenProvider};
pub use types::{AccessToken, OAuthCredentials};
