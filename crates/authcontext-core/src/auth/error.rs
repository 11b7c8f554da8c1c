use thiserror::Error;

use crate::api::ApiError;

use super::cookies::StoreError;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Stored session is no longer valid")]
    SessionExpired,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl AuthError {
    /// Map a failed `POST /sessions` call
    pub(crate) fn from_sign_in(error: ApiError) -> Self {
        if error.is_unauthorized() {
            AuthError::InvalidCredentials
        } else {
            AuthError::Api(error)
        }
    }

    /// Map a failed `GET /me` call made with a stored token
    pub(crate) fn from_restore(error: ApiError) -> Self {
        if error.is_unauthorized() {
            AuthError::SessionExpired
        } else {
            AuthError::Api(error)
        }
    }

    /// Short message suitable for showing next to a login form
    pub fn user_message(&self) -> String {
        match self {
            AuthError::InvalidCredentials => "Invalid email or password".to_string(),
            AuthError::SessionExpired => "Your session has expired. Please sign in again.".to_string(),
            AuthError::Api(ApiError::NetworkError(e)) if e.is_timeout() => {
                "Connection timed out. Please try again.".to_string()
            }
            AuthError::Api(ApiError::NetworkError(_)) => {
                "Unable to connect to server. Check your internet connection.".to_string()
            }
            AuthError::Api(ApiError::RateLimited) => {
                "Too many attempts. Please wait and try again.".to_string()
            }
            AuthError::Api(e) => format!("Sign-in failed: {}", e),
            AuthError::Storage(e) => format!("Could not access saved session: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_maps_per_operation() {
        assert!(matches!(AuthError::from_sign_in(ApiError::Unauthorized), AuthError::InvalidCredentials));
        assert!(matches!(AuthError::from_restore(ApiError::Unauthorized), AuthError::SessionExpired));
        assert!(matches!(
            AuthError::from_sign_in(ApiError::ServerError("boom".into())),
            AuthError::Api(ApiError::ServerError(_))
        ));
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(AuthError::InvalidCredentials.user_message(), "Invalid email or password");
        assert!(AuthError::Api(ApiError::RateLimited).user_message().contains("Too many attempts"));
        assert!(AuthError::Api(ApiError::ServerError("boom".into()))
            .user_message()
            .contains("boom"));
    }
}
