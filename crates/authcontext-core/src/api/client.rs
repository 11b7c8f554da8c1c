//! API client for the authentication backend.
//!
//! This module provides the `ApiClient` struct for creating sessions and
//! fetching the signed-in user's profile.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::models::{Credentials, Profile, SessionGrant};

use super::{ApiError, CredentialExchange};

// ============================================================================
// Constants
// ============================================================================

/// Path of the session-creation endpoint
const SESSIONS_PATH: &str = "sessions";

/// Path of the current-user endpoint
const ME_PATH: &str = "me";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

type Result<T> = std::result::Result<T, ApiError>;

/// API client for the authentication backend.
/// Clones share the connection pool and the bearer token.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Arc<str>,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set the bearer token for authenticated requests.
    /// Every clone of this client sees the change.
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    /// The bearer token currently attached to requests
    pub fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Authenticate with email and password, returning the issued tokens
    pub async fn create_session(&self, credentials: &Credentials) -> Result<SessionGrant> {
        debug!(email = %credentials.email, "Creating session");
        self.post(SESSIONS_PATH, credentials).await
    }

    /// Fetch the profile of the user owning the current token
    pub async fn me(&self) -> Result<Profile> {
        self.get(ME_PATH).await
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = self.token() {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: reqwest::Response) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse_body<T: DeserializeOwned>(response: reqwest::Response, url: &str) -> Result<T> {
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse JSON from {}: {}", url, e)))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path);
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .get(&url)
                .headers(self.auth_headers()?)
                .send()
                .await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => return Self::parse_body(response, &url).await,
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
            }
        }
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.endpoint(path);
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .post(&url)
                .headers(self.auth_headers()?)
                .json(body)
                .send()
                .await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => return Self::parse_body(response, &url).await,
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
            }
        }
    }
}

#[async_trait]
impl CredentialExchange for ApiClient {
    async fn create_session(&self, credentials: &Credentials) -> Result<SessionGrant> {
        ApiClient::create_session(self, credentials).await
    }

    async fn fetch_profile(&self) -> Result<Profile> {
        self.me().await
    }

    fn set_bearer_token(&self, token: Option<&str>) {
        self.set_token(token.map(str::to_string));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_paths() {
        let api = ApiClient::new("http://localhost:3333/").expect("Failed to build client");
        assert_eq!(api.base_url(), "http://localhost:3333");
        assert_eq!(api.endpoint("sessions"), "http://localhost:3333/sessions");
        assert_eq!(api.endpoint("/me"), "http://localhost:3333/me");
    }

    #[test]
    fn test_auth_headers_without_token() {
        let api = ApiClient::new("http://localhost:3333").expect("Failed to build client");
        let headers = api.auth_headers().expect("Failed to build headers");
        assert!(headers.get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_auth_headers_carry_bearer_token() {
        let api = ApiClient::new("http://localhost:3333").expect("Failed to build client");
        api.set_token(Some("tok-1".to_string()));
        let headers = api.auth_headers().expect("Failed to build headers");
        assert_eq!(headers.get(header::AUTHORIZATION).unwrap(), "Bearer tok-1");
    }

    #[test]
    fn test_clones_share_token() {
        let api = ApiClient::new("http://localhost:3333").expect("Failed to build client");
        let clone = api.clone();
        api.set_bearer_token(Some("tok-2"));
        assert_eq!(clone.token().as_deref(), Some("tok-2"));

        clone.set_bearer_token(None);
        assert!(api.token().is_none());
    }

    #[test]
    fn test_invalid_token_is_rejected() {
        let api = ApiClient::new("http://localhost:3333").expect("Failed to build client");
        api.set_token(Some("bad\ntoken".to_string()));
        assert!(matches!(api.auth_headers(), Err(ApiError::InvalidToken(_))));
    }
}
