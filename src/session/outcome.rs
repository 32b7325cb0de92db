use thiserror::Error;

use crate::models::Role;
use crate::transport::ApiError;

pub const LOGIN_FALLBACK: &str = "Login failed. Please try again.";
pub const FEDERATED_LOGIN_FALLBACK: &str = "Google login failed. Please try again.";
pub const REGISTER_FALLBACK: &str = "Registration failed. Please try again.";

/// A failed login, federated login or registration, with a message fit for the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct LoginFailure {
    pub message: String,
}

impl LoginFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Use the backend's `detail` when there is one, `fallback` otherwise.
    pub fn from_api(err: &ApiError, fallback: &str) -> Self {
        Self::new(err.detail().unwrap_or(fallback))
    }
}

/// On success, the role the backend granted, so the caller can route to its home.
pub type LoginResult = Result<Role, LoginFailure>;
