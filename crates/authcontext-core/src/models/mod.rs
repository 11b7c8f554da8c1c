//! Data models for the authentication context.
//!
//! This module contains the data structures shared by the session store
//! and the API client:
//!
//! - `User`, `Credentials`: the signed-in identity and sign-in input
//! - `AuthState`: the explicit authenticated/unauthenticated state
//! - `TokenPair`, `SessionGrant`, `Profile`: wire types of the auth API

pub mod session;
pub mod user;

pub use session::{AuthState, Profile, SessionGrant, TokenPair};
pub use user::{Credentials, User};
