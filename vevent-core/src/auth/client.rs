//! The authentication API collaborator.

use futures::future::BoxFuture;

use super::error::AuthError;
use super::types::{AuthSession, Credentials};

/// External authentication API.
///
/// The coordinator does not know the transport. Each call must complete
/// exactly once; a call that never completes leaves the login in flight
/// unless a timeout is configured.
pub trait AuthApiClient: Send + Sync {
    /// Exchanges credentials for a session.
    fn login(&self, credentials: Credentials) -> BoxFuture<'static, Result<AuthSession, AuthError>>;
}
