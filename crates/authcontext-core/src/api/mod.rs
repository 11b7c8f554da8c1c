//! REST API client module for the authentication backend.
//!
//! This module provides the `ApiClient` for exchanging credentials for a
//! token pair (`POST /sessions`) and fetching the current user's profile
//! (`GET /me`). Once a token is set, every request carries it as a bearer
//! credential.
//!
//! The session store talks to the backend through the `CredentialExchange`
//! trait so tests can substitute an in-process fake.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;

use async_trait::async_trait;

use crate::models::{Credentials, Profile, SessionGrant};

#[async_trait]
pub trait CredentialExchange: Send + Sync {
    /// Exchange credentials for a token pair and the user's grants.
    async fn create_session(&self, credentials: &Credentials) -> Result<SessionGrant, ApiError>;

    /// Fetch the profile of the user owning the current bearer token.
    async fn fetch_profile(&self) -> Result<Profile, ApiError>;

    /// Set or clear the bearer token attached to every subsequent request.
    fn set_bearer_token(&self, token: Option<&str>);
}
