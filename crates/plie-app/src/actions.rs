//! State transition messages.

use plie_core::AppError;
use plie_core::events::Event;
use plie_core::login::UserProfile;

use crate::task::TaskId;

/// Actions dispatched to the store.
///
/// The session changes only through the four login/logout actions; the
/// events slice only through the three fetch actions.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A login attempt started.
    LoginRequest,
    /// A token was obtained and persisted (or restored at startup).
    LoginSuccess {
        token: String,
        user: Option<UserProfile>,
    },
    /// The login attempt failed.
    LoginFailure { error: AppError },
    /// Reset the session to its initial value.
    Logout,

    /// A fetch of the event listing started.
    FetchEventsRequest { task: TaskId },
    /// The fetch `task` returned a new listing.
    FetchEventsSuccess { task: TaskId, items: Vec<Event> },
    /// The fetch `task` failed.
    FetchEventsFailure { task: TaskId, error: AppError },
}

impl Action {
    /// Stable name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Action::LoginRequest => "LOGIN_REQUEST",
            Action::LoginSuccess { .. } => "LOGIN_SUCCESS",
            Action::LoginFailure { .. } => "LOGIN_FAILURE",
            Action::Logout => "LOGOUT",
            Action::FetchEventsRequest { .. } => "FETCH_EVENTS_REQUEST",
            Action::FetchEventsSuccess { .. } => "FETCH_EVENTS_SUCCESS",
            Action::FetchEventsFailure { .. } => "FETCH_EVENTS_FAILURE",
        }
    }
}
