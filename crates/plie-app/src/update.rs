//! Reducer (update function).
//!
//! All state mutations happen here. The store calls `update(state, action)`
//! and notifies subscribers only when the transition was applied.

use crate::actions::Action;
use crate::state::{AppState, Session};

/// Outcome of reducing one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// State changed.
    Applied,
    /// The action was rejected or superseded; state is untouched.
    Ignored,
}

impl Transition {
    pub fn is_applied(self) -> bool {
        self == Transition::Applied
    }
}

/// The main reducer function.
pub fn update(state: &mut AppState, action: Action) -> Transition {
    match action {
        Action::LoginRequest => {
            // Reject-while-in-flight: a second login never overlaps the first.
            if state.auth.loading {
                return Transition::Ignored;
            }
            state.auth.loading = true;
            state.auth.error = None;
            Transition::Applied
        }
        Action::LoginSuccess { token, user } => {
            if token.trim().is_empty() {
                return Transition::Ignored;
            }
            state.auth = Session {
                token: Some(token),
                user,
                is_authenticated: true,
                loading: false,
                error: None,
            };
            Transition::Applied
        }
        Action::LoginFailure { error } => {
            state.auth = Session {
                error: Some(error),
                ..Session::default()
            };
            Transition::Applied
        }
        Action::Logout => {
            state.auth = Session::default();
            Transition::Applied
        }
        Action::FetchEventsRequest { task } => {
            state.events.task.on_started(task);
            state.events.loading = true;
            state.events.error = None;
            Transition::Applied
        }
        Action::FetchEventsSuccess { task, items } => {
            if !state.events.task.finish_if_active(task) {
                return Transition::Ignored;
            }
            state.events.items = items;
            state.events.loading = false;
            state.events.error = None;
            state.events.loaded_once = true;
            Transition::Applied
        }
        Action::FetchEventsFailure { task, error } => {
            if !state.events.task.finish_if_active(task) {
                return Transition::Ignored;
            }
            state.events.loading = false;
            state.events.error = Some(error);
            Transition::Applied
        }
    }
}
