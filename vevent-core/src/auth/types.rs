//! Authentication data types.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::ZeroizeOnDrop;

/// Email/password pair handed to the API client.
///
/// The password is zeroized on drop and never printed by `Debug`.
#[derive(Clone, ZeroizeOnDrop)]
pub struct Credentials {
    #[zeroize(skip)]
    email: String,
    password: String,
}

impl Credentials {
    /// Creates credentials from form input.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// The email address.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// The password. Do not log or persist.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// What a successful login returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    /// Bearer token, when the API issues one.
    pub session_token: Option<String>,
    /// User payload exactly as the API returned it.
    pub user: serde_json::Value,
    /// When the login completed (UTC).
    pub authenticated_at: DateTime<Utc>,
}

impl AuthSession {
    /// Creates a session stamped with the current time.
    #[must_use]
    pub fn new(session_token: Option<String>, user: serde_json::Value) -> Self {
        Self {
            session_token,
            user,
            authenticated_at: Utc::now(),
        }
    }
}

/// Login flow state. Exactly one is active at a time.
///
/// Allowed transitions:
///
/// ```text
/// Idle ──▶ InFlight ──┬──▶ Authenticated ──▶ Idle
///                     └──▶ Failed ─────────▶ Idle
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum LoginState {
    /// No request made, or the previous outcome was dismissed.
    #[default]
    Idle,
    /// A login request is outstanding.
    InFlight,
    /// Logged in.
    Authenticated(AuthSession),
    /// The last attempt failed; holds the message shown to the user.
    Failed(String),
}

impl LoginState {
    /// Returns true if a request is outstanding.
    #[must_use]
    pub const fn is_in_flight(&self) -> bool {
        matches!(self, Self::InFlight)
    }

    /// Returns true if logged in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// The failure message, if the last attempt failed.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Whether moving from `self` to `next` is a legal transition.
    #[must_use]
    pub fn can_transition_to(&self, next: &Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::InFlight)
                | (Self::InFlight, Self::Authenticated(_) | Self::Failed(_))
                | (Self::Authenticated(_) | Self::Failed(_), Self::Idle)
        )
    }

    /// Short label for logs; never includes tokens or user data.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::InFlight => "in-flight",
            Self::Authenticated(_) => "authenticated",
            Self::Failed(_) => "failed",
        }
    }
}

/// Settings for the login flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AuthSettings {
    /// Give up on a login request after this many seconds.
    ///
    /// `None` (default) waits forever.
    pub login_timeout_secs: Option<u64>,
}

impl AuthSettings {
    /// The login timeout as a [`Duration`], if one is configured.
    #[must_use]
    pub fn login_timeout(&self) -> Option<Duration> {
        self.login_timeout_secs.map(Duration::from_secs)
    }
}
