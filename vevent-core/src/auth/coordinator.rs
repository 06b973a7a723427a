//! Login flow coordinator.
//!
//! Drives [`LoginState`] through `Idle → InFlight → {Authenticated | Failed}`
//! and back to `Idle`. Every transition is checked against
//! [`LoginState::can_transition_to`] and published to `watch` observers.

use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::watch;

use crate::dispatch::{Mailbox, RequestId};

use super::client::AuthApiClient;
use super::error::{AuthError, Result};
use super::types::{AuthSession, AuthSettings, Credentials, LoginState};

/// Completion message for a login request.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginCompletion {
    /// Request this result answers.
    pub request: RequestId,
    /// Client outcome.
    pub outcome: std::result::Result<AuthSession, AuthError>,
}

/// Owns the login state for the app.
pub struct AuthCoordinator {
    client: Arc<dyn AuthApiClient>,
    settings: AuthSettings,
    mailbox: Mailbox<LoginCompletion>,
    state: LoginState,
    in_flight: Option<RequestId>,
    observers: watch::Sender<LoginState>,
}

impl AuthCoordinator {
    /// Creates an idle coordinator. Login calls run on `runtime`.
    #[must_use]
    pub fn new(client: Arc<dyn AuthApiClient>, settings: AuthSettings, runtime: Handle) -> Self {
        let (observers, _) = watch::channel(LoginState::Idle);
        Self {
            client,
            settings,
            mailbox: Mailbox::new(runtime),
            state: LoginState::Idle,
            in_flight: None,
            observers,
        }
    }

    /// Current login state.
    #[must_use]
    pub const fn state(&self) -> &LoginState {
        &self.state
    }

    /// The active session, if logged in.
    #[must_use]
    pub const fn session(&self) -> Option<&AuthSession> {
        match &self.state {
            LoginState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LoginState> {
        self.observers.subscribe()
    }

    /// Starts a login request.
    ///
    /// A previous failure or session is dismissed first (`→ Idle`), then the
    /// state moves to `InFlight`. The outcome is applied by
    /// [`pump`](Self::pump) or [`next_update`](Self::next_update).
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::LoginInProgress`] if a request is already in
    /// flight; the state is left untouched.
    pub fn submit_login(&mut self, email: &str, password: &str) -> Result<RequestId> {
        if self.state.is_in_flight() {
            log::warn!("login submitted while another request is in flight");
            return Err(AuthError::LoginInProgress);
        }
        if self.state != LoginState::Idle {
            self.transition(LoginState::Idle);
        }

        let request = self.mailbox.next_request_id();
        let login = self.client.login(Credentials::new(email, password));
        let timeout = self.settings.login_timeout();

        self.in_flight = Some(request);
        self.transition(LoginState::InFlight);

        self.mailbox.dispatch(async move {
            let outcome = match timeout {
                Some(limit) => tokio::time::timeout(limit, login)
                    .await
                    .unwrap_or(Err(AuthError::Timeout(limit.as_secs()))),
                None => login.await,
            };
            LoginCompletion { request, outcome }
        });

        Ok(request)
    }

    /// Dismisses a failure message. Returns `false` if not in `Failed`.
    pub fn reset(&mut self) -> bool {
        if matches!(self.state, LoginState::Failed(_)) {
            self.transition(LoginState::Idle);
            true
        } else {
            false
        }
    }

    /// Drops the session. Returns `false` if not logged in.
    pub fn sign_out(&mut self) -> bool {
        if self.state.is_authenticated() {
            log::info!("signing out");
            self.transition(LoginState::Idle);
            true
        } else {
            false
        }
    }

    /// Applies every finished login without waiting.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Some(completion) = self.mailbox.try_next() {
            self.apply(completion);
            applied += 1;
        }
        applied
    }

    /// Waits for the next finished login and applies it.
    pub async fn next_update(&mut self) {
        if let Some(completion) = self.mailbox.next().await {
            self.apply(completion);
        }
    }

    fn apply(&mut self, completion: LoginCompletion) {
        let LoginCompletion { request, outcome } = completion;
        if self.in_flight != Some(request) {
            log::debug!("ignoring stale login completion {request}");
            return;
        }
        self.in_flight = None;

        match outcome {
            Ok(session) => {
                log::info!("login {request} succeeded");
                self.transition(LoginState::Authenticated(session));
            }
            Err(e) => {
                log::warn!("login {request} failed: {e}");
                self.transition(LoginState::Failed(format!("Login failed: {e}")));
            }
        }
    }

    fn transition(&mut self, next: LoginState) {
        debug_assert!(
            self.state.can_transition_to(&next),
            "illegal login transition {} -> {}",
            self.state.label(),
            next.label()
        );
        log::debug!("login state {} -> {}", self.state.label(), next.label());
        self.state = next;
        self.observers.send_replace(self.state.clone());
    }
}

impl fmt::Debug for AuthCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthCoordinator")
            .field("state", &self.state.label())
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}
