//! Authentication module for Vevent.
//!
//! Owns the email/password login flow shown on the login screen:
//! - [`AuthCoordinator`] drives the [`LoginState`] machine
//! - [`AuthApiClient`] is the injected transport to the auth API
//! - [`Credentials`] keep the password out of logs and wipe it on drop
//!
//! # Example Usage
//!
//! ```
//! use vevent_core::auth::{AuthError, LoginState};
//!
//! let err = AuthError::InvalidCredentials("The password is incorrect.".to_string());
//! let state = LoginState::Failed(format!("Login failed: {err}"));
//! assert_eq!(state.error_message(), Some("Login failed: The password is incorrect."));
//! ```

mod client;
pub mod coordinator;
mod error;
pub mod types;

pub use client::AuthApiClient;
pub use coordinator::{AuthCoordinator, LoginCompletion};
pub use error::{AuthError, Result};
pub use types::{AuthSession, AuthSettings, Credentials, LoginState};
