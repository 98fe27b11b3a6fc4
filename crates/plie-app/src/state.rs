//! Application state composition.
//!
//! ```text
//! AppState
//! ├── auth: Session       (token, profile, login request state)
//! └── events: EventsState (listing, fetch request state)
//! ```
//!
//! Both slices are owned by the [`Store`](crate::store::Store) and only the
//! reducer mutates them.

use plie_core::AppError;
use plie_core::events::Event;
use plie_core::login::UserProfile;
use serde::Serialize;

use crate::task::TaskState;

/// Combined application state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppState {
    pub auth: Session,
    pub events: EventsState,
}

// ============================================================================
// Session
// ============================================================================

/// Authentication slice.
///
/// `is_authenticated` is true iff `token` holds a non-empty string.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Session {
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub user: Option<UserProfile>,
    pub is_authenticated: bool,
    pub loading: bool,
    pub error: Option<AppError>,
}

/// Login lifecycle phase, derived from [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
    Anonymous,
    Authenticating,
    Authenticated,
    AuthFailed,
}

impl AuthStatus {
    pub fn label(self) -> &'static str {
        match self {
            AuthStatus::Anonymous => "anonymous",
            AuthStatus::Authenticating => "authenticating",
            AuthStatus::Authenticated => "authenticated",
            AuthStatus::AuthFailed => "auth_failed",
        }
    }
}

impl Session {
    pub fn status(&self) -> AuthStatus {
        if self.loading {
            AuthStatus::Authenticating
        } else if self.is_authenticated {
            AuthStatus::Authenticated
        } else if self.error.is_some() {
            AuthStatus::AuthFailed
        } else {
            AuthStatus::Anonymous
        }
    }
}

// ============================================================================
// EventsState
// ============================================================================

/// Event listing slice.
///
/// `items` is replaced wholesale by each applied fetch. `task` names the
/// latest fetch; results of older fetches are discarded.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventsState {
    pub items: Vec<Event>,
    pub loading: bool,
    pub error: Option<AppError>,
    #[serde(skip)]
    pub task: TaskState,
    /// Whether any fetch has been applied since startup.
    #[serde(skip)]
    pub loaded_once: bool,
}

/// Fetch lifecycle phase, derived from [`EventsState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    Idle,
    Fetching,
    Loaded,
    FetchFailed,
}

impl EventsState {
    pub fn status(&self) -> FetchStatus {
        if self.loading {
            FetchStatus::Fetching
        } else if self.error.is_some() {
            FetchStatus::FetchFailed
        } else if self.loaded_once {
            FetchStatus::Loaded
        } else {
            FetchStatus::Idle
        }
    }
}
