//! Authentication module for managing the client session.
//!
//! This module provides:
//! - `SessionStore`: in-memory authentication state with restore and sign-in
//! - `TokenStore`: persistence of the token pair (`MemoryCookieJar`,
//!   `FileCookieJar`, `KeyringTokenStore`)
//! - `AuthError`: typed failures surfaced to callers
//!
//! Tokens are stored under `nextauth.token` / `nextauth.refreshToken` and
//! expire after 30 days.

pub mod cookies;
pub mod error;
pub mod keychain;
pub mod session;

pub use cookies::{
    CookieOptions, FileCookieJar, MemoryCookieJar, StoreError, TokenStore, REFRESH_TOKEN_COOKIE,
    SESSION_MAX_AGE_SECS, TOKEN_COOKIE,
};
pub use error::AuthError;
pub use keychain::KeyringTokenStore;
pub use session::{RestoreFailurePolicy, SessionOptions, SessionStore};
