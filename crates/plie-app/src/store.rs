//! Single source of truth for application state.
//!
//! The store wraps a `watch` channel: `dispatch` runs the reducer in place
//! and wakes subscribers only when the transition was applied. Reducer calls
//! are serialized by the channel's lock, so dispatches from concurrent tasks
//! never interleave.

use std::sync::Arc;

use tokio::sync::watch;

use crate::actions::Action;
use crate::state::AppState;
use crate::task::{TaskId, TaskSeq};
use crate::update::{Transition, update};

/// Shared handle to the application state.
///
/// Cloning is cheap; all clones observe the same state.
#[derive(Debug, Clone)]
pub struct Store {
    tx: Arc<watch::Sender<AppState>>,
    tasks: Arc<TaskSeq>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}

impl Store {
    pub fn new(initial: AppState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            tx: Arc::new(tx),
            tasks: Arc::new(TaskSeq::default()),
        }
    }

    /// Reduces `action` into the state and notifies subscribers on change.
    pub fn dispatch(&self, action: Action) -> Transition {
        let name = action.name();
        let mut outcome = Transition::Ignored;
        self.tx.send_if_modified(|state| {
            outcome = update(state, action);
            outcome.is_applied()
        });
        tracing::debug!(action = name, applied = outcome.is_applied(), "dispatch");
        outcome
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> AppState {
        self.tx.borrow().clone()
    }

    /// Reads the current state without cloning it.
    pub fn with_state<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.tx.borrow())
    }

    pub fn subscribe(&self) -> StoreSubscription {
        StoreSubscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Allocates an id for a new fetch.
    pub fn next_task(&self) -> TaskId {
        self.tasks.next_id()
    }
}

/// Receives a notification after each applied transition.
#[derive(Debug)]
pub struct StoreSubscription {
    rx: watch::Receiver<AppState>,
}

impl StoreSubscription {
    /// Waits for the next applied transition and returns the new state.
    ///
    /// Returns `None` once every [`Store`] handle has been dropped.
    pub async fn changed(&mut self) -> Option<AppState> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    pub fn current(&self) -> AppState {
        self.rx.borrow().clone()
    }
}
