use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::api::CredentialExchange;
use crate::models::{AuthState, Credentials, TokenPair, User};
use crate::navigation::{Navigator, DEFAULT_POST_LOGIN_ROUTE};

use super::cookies::{CookieOptions, StoreError, TokenStore, REFRESH_TOKEN_COOKIE, TOKEN_COOKIE};
use super::AuthError;

/// What to do with stored tokens when restoring the session fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreFailurePolicy {
    /// Leave the tokens in place; the next start tries again.
    #[default]
    Keep,
    /// Drop the tokens only when the server rejected them (HTTP 401).
    ClearOnUnauthorized,
    /// Drop the tokens on any failure.
    ClearAlways,
}

impl RestoreFailurePolicy {
    fn should_clear(self, error: &AuthError) -> bool {
        match self {
            RestoreFailurePolicy::Keep => false,
            RestoreFailurePolicy::ClearOnUnauthorized => matches!(error, AuthError::SessionExpired),
            RestoreFailurePolicy::ClearAlways => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub post_login_route: String,
    pub restore_failure_policy: RestoreFailurePolicy,
    pub cookie: CookieOptions,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            post_login_route: DEFAULT_POST_LOGIN_ROUTE.to_string(),
            restore_failure_policy: RestoreFailurePolicy::default(),
            cookie: CookieOptions::default(),
        }
    }
}

/// In-memory authentication state plus the operations that change it.
///
/// The store is shared as `Arc<SessionStore>`; writers race with
/// last-write-wins semantics and subscribers see every published state.
pub struct SessionStore {
    api: Arc<dyn CredentialExchange>,
    tokens: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
    options: SessionOptions,
    state: watch::Sender<AuthState>,
}

impl SessionStore {
    pub fn new(
        api: Arc<dyn CredentialExchange>,
        tokens: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (state, _) = watch::channel(AuthState::Unauthenticated);
        Self {
            api,
            tokens,
            navigator,
            options: SessionOptions::default(),
            state,
        }
    }

    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Snapshot of the current state
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Receive every state change from now on
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Rebuild the session from a stored token.
    ///
    /// Without a stored token the state is left as it is. With one, the
    /// token is attached to the client and the profile is fetched from
    /// `GET /me`. On failure the state is unchanged, the rejected token is
    /// detached from the client and the stored tokens are handled according
    /// to the restore failure policy.
    pub async fn restore(&self) -> Result<AuthState, AuthError> {
        let token = match self.tokens.get(TOKEN_COOKIE) {
            Ok(Some(token)) if !token.is_empty() => token,
            Ok(_) => {
                debug!("No stored session token");
                return Ok(self.state());
            }
            Err(e) => {
                warn!(error = %e, "Failed to read stored session token");
                return Err(e.into());
            }
        };

        self.api.set_bearer_token(Some(&token));

        match self.api.fetch_profile().await {
            Ok(profile) => {
                let user = User::from(profile);
                info!(email = %user.email, "Session restored");
                let state = AuthState::Authenticated(user);
                self.state.send_replace(state.clone());
                Ok(state)
            }
            Err(e) => {
                let error = AuthError::from_restore(e);
                warn!(error = %error, "Failed to restore session");
                self.api.set_bearer_token(None);
                if self.options.restore_failure_policy.should_clear(&error) {
                    debug!("Clearing stored session tokens");
                    // Failures are already logged; the restore error wins
                    let _ = self.clear_tokens();
                }
                Err(error)
            }
        }
    }

    /// Exchange credentials for a session.
    ///
    /// On success the token pair is persisted, the client starts sending the
    /// new bearer token, the state becomes authenticated and the navigator is
    /// sent to the post-login route. On failure nothing changes.
    pub async fn sign_in(&self, credentials: Credentials) -> Result<User, AuthError> {
        let grant = match self.api.create_session(&credentials).await {
            Ok(grant) => grant,
            Err(e) => {
                let error = AuthError::from_sign_in(e);
                error!(email = %credentials.email, error = %error, "Sign-in failed");
                return Err(error);
            }
        };

        let tokens = grant.tokens();
        self.persist_tokens(&tokens);

        let user = User::new(credentials.email, grant.permissions, grant.roles);
        self.state.send_replace(AuthState::Authenticated(user.clone()));

        self.api.set_bearer_token(Some(&tokens.access_token));

        info!(email = %user.email, "Sign-in successful");
        self.navigator.navigate(&self.options.post_login_route);

        Ok(user)
    }

    /// Forget the session: stored tokens, bearer token and in-memory user.
    ///
    /// The in-memory session is always dropped. A failure to remove a stored
    /// token is reported after both removals were attempted.
    pub fn sign_out(&self) -> Result<(), AuthError> {
        self.api.set_bearer_token(None);
        let removed = self.clear_tokens();
        self.state.send_replace(AuthState::Unauthenticated);
        info!("Signed out");
        removed.map_err(AuthError::from)
    }

    fn persist_tokens(&self, tokens: &TokenPair) {
        let cookie = &self.options.cookie;
        if let Err(e) = self.tokens.set(TOKEN_COOKIE, &tokens.access_token, cookie) {
            warn!(error = %e, "Failed to persist session token");
        }
        if let Err(e) = self.tokens.set(REFRESH_TOKEN_COOKIE, &tokens.refresh_token, cookie) {
            warn!(error = %e, "Failed to persist refresh token");
        }
    }

    /// Remove both stored tokens, returning the first failure
    fn clear_tokens(&self) -> Result<(), StoreError> {
        let mut result = Ok(());
        for key in [TOKEN_COOKIE, REFRESH_TOKEN_COOKIE] {
            if let Err(e) = self.tokens.remove(key) {
                warn!(key, error = %e, "Failed to remove stored token");
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }
}

// ============================================================================
// Tests
// ============================================================================
