//! Error types for authentication.
//!
//! Client-reported failures carry the client's own description unchanged, so
//! the UI can show `Login failed: <description>`.

use thiserror::Error;

/// Errors that can occur while logging in.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The API rejected the email/password pair.
    #[error("{0}")]
    InvalidCredentials(String),

    /// The request never got a usable answer.
    #[error("{0}")]
    Network(String),

    /// The configured login timeout elapsed.
    #[error("Login request timed out after {0}s")]
    Timeout(u64),

    /// `submit_login` was called while a request was still in flight.
    #[error("A login request is already in progress")]
    LoginInProgress,
}

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;
