//! Client-side authentication context.
//!
//! Tracks the signed-in user and their permissions, persists the session
//! token pair across restarts and restores the session on start-up.
//!
//! - `auth::SessionStore`: authentication state with `restore`, `sign_in`
//!   and `sign_out`, observable through `subscribe`
//! - `api::ApiClient`: HTTP client for `POST /sessions` and `GET /me`
//! - `auth::TokenStore`: cookie-style token persistence
//! - `config::Config`: user configuration on disk

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod navigation;

pub use api::{ApiClient, ApiError, CredentialExchange};
pub use auth::{AuthError, SessionStore};
pub use config::Config;
pub use models::{AuthState, Credentials, User};
pub use navigation::{Navigator, RouteHistory};
