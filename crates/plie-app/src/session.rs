//! Auth lifecycle: login, logout and startup session restore.
//!
//! ```text
//! anonymous ──login──▶ authenticating ──ok──▶ authenticated
//!     ▲                      │                     │
//!     │                      └──err──▶ auth_failed │
//!     └────────────────── logout / 401 ────────────┘
//! ```
//!
//! A token is persisted before the session is declared authenticated, and
//! cleared from storage before the session is reset. Only one login may be
//! in flight; a second call is rejected with `ErrorKind::Busy`.

use plie_core::gateway::{Gateway, UnauthorizedHook, unauthorized_hook};
use plie_core::login::{LOGIN_FAILED_MESSAGE, LOGIN_PATH, LoginPayload, extract_login, login_form};
use plie_core::{AppError, ErrorKind};

use crate::actions::Action;
use crate::state::AuthStatus;
use crate::store::Store;
use crate::update::Transition;

/// Drives the `auth` slice through the gateway and credential store.
#[derive(Debug, Clone)]
pub struct AuthLifecycle {
    store: Store,
    gateway: Gateway,
}

impl AuthLifecycle {
    pub fn new(store: Store, gateway: Gateway) -> Self {
        Self { store, gateway }
    }

    /// Hook for [`Gateway::with_unauthorized_hook`].
    ///
    /// Resets an authenticated session once the gateway has cleared the
    /// stored token after a 401. A session that is still logging in is left
    /// to its own failure path.
    pub fn unauthorized_hook(store: Store) -> UnauthorizedHook {
        unauthorized_hook(move || {
            let store = store.clone();
            async move {
                if store.with_state(|s| s.auth.is_authenticated) {
                    tracing::info!("session rejected by server; logging out");
                    store.dispatch(Action::Logout);
                }
            }
        })
    }

    /// Logs in with `email` and `password`.
    ///
    /// # Errors
    /// - `Busy` if another login is in flight (nothing is dispatched)
    /// - `AuthRejected` if the server answered with a non-2xx status
    /// - `Network`/`Timeout` for transport failures
    /// - `MalformedResponse` if no token could be extracted
    /// - `Storage` if the token could not be persisted
    ///
    /// Every error except `Busy` is also recorded in the session.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), AppError> {
        if self.store.dispatch(Action::LoginRequest) == Transition::Ignored {
            return Err(AppError::new(
                ErrorKind::Busy,
                "A login is already in progress",
            ));
        }

        match self.authenticate(email, password).await {
            Ok(LoginPayload { token, user }) => {
                let user = (!user.is_empty()).then_some(user);
                self.store.dispatch(Action::LoginSuccess { token, user });
                tracing::info!("login succeeded");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(kind = %err.kind, error = %err, "login failed");
                let error = login_failure(err);
                self.store.dispatch(Action::LoginFailure {
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<LoginPayload, AppError> {
        let response = self
            .gateway
            .post(LOGIN_PATH, Some(login_form(email, password)), false)
            .await?;
        let payload = extract_login(&response.body)?;
        self.gateway.credentials().put(&payload.token).await?;
        Ok(payload)
    }

    /// Clears the stored token, then resets the session.
    ///
    /// # Errors
    /// Returns a `Storage` error if the token could not be cleared. The
    /// session is left as it was; use [`AuthLifecycle::force_logout`] to
    /// reset it anyway.
    pub async fn logout(&self) -> Result<(), AppError> {
        self.gateway.credentials().clear().await?;
        self.store.dispatch(Action::Logout);
        tracing::info!("logged out");
        Ok(())
    }

    /// Resets the session even if storage cannot be cleared.
    pub async fn force_logout(&self) {
        let credentials = self.gateway.credentials();
        if let Err(err) = credentials.clear().await {
            tracing::warn!(error = %err, "stored token not cleared; resetting local session anyway");
        }
        credentials.clear_cached();
        self.store.dispatch(Action::Logout);
    }

    /// Restores the session from storage without contacting the server.
    ///
    /// A stored token is trusted until the gateway sees a 401.
    pub async fn check_session(&self) -> AuthStatus {
        match self.gateway.credentials().get().await {
            Some(token) => {
                self.store.dispatch(Action::LoginSuccess { token, user: None });
                tracing::debug!("restored session from stored token");
            }
            None => tracing::debug!("no stored token"),
        }
        self.status()
    }

    pub fn status(&self) -> AuthStatus {
        self.store.with_state(|s| s.auth.status())
    }
}

/// Maps a login error to what the login screen shows.
///
/// Server rejections become `AuthRejected` and keep the server's message;
/// everything else shows the generic fallback text.
fn login_failure(err: AppError) -> AppError {
    let Some(status) = err.status_code else {
        return AppError::new(err.kind, LOGIN_FAILED_MESSAGE);
    };
    let message = if err.is_status_fallback() {
        LOGIN_FAILED_MESSAGE.to_string()
    } else {
        err.message
    };
    AppError {
        kind: ErrorKind::AuthRejected,
        message,
        status_code: Some(status),
    }
}
