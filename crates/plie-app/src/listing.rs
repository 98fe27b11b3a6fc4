//! Events fetch lifecycle.
//!
//! Every call re-checks the stored token and re-runs the request, so
//! `fetch_events` doubles as refresh. Fetches are not cancelled; when they
//! overlap, only the most recently started one may update the `events` slice.

use plie_core::AppError;
use plie_core::events::{EVENTS_PATH, Event, parse_events};
use plie_core::gateway::Gateway;

use crate::actions::Action;
use crate::state::FetchStatus;
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct EventsLifecycle {
    store: Store,
    gateway: Gateway,
}

impl EventsLifecycle {
    pub fn new(store: Store, gateway: Gateway) -> Self {
        Self { store, gateway }
    }

    /// Fetches the event listing and replaces `events.items` with it.
    ///
    /// The fetched items are returned to the caller even when a newer fetch
    /// has superseded this one and the store ignored them.
    ///
    /// # Errors
    /// - `MissingCredential` if no token is stored (the server is not called)
    /// - any gateway error (`AuthRejected` on 401, `HttpStatus`, `Network`, ...)
    /// - `MalformedResponse` if the listing has no accepted shape
    pub async fn fetch_events(&self) -> Result<Vec<Event>, AppError> {
        let task = self.store.next_task();
        self.store.dispatch(Action::FetchEventsRequest { task });

        match self.load().await {
            Ok(items) => {
                let count = items.len();
                let applied = self
                    .store
                    .dispatch(Action::FetchEventsSuccess {
                        task,
                        items: items.clone(),
                    })
                    .is_applied();
                if applied {
                    tracing::info!(count, "events loaded");
                } else {
                    tracing::debug!(task = task.0, "superseded fetch finished; result discarded");
                }
                Ok(items)
            }
            Err(error) => {
                tracing::warn!(kind = %error.kind, error = %error, "events fetch failed");
                self.store.dispatch(Action::FetchEventsFailure {
                    task,
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }

    /// Re-runs [`EventsLifecycle::fetch_events`].
    ///
    /// # Errors
    /// See [`EventsLifecycle::fetch_events`].
    pub async fn refresh(&self) -> Result<Vec<Event>, AppError> {
        self.fetch_events().await
    }

    pub fn status(&self) -> FetchStatus {
        self.store.with_state(|s| s.events.status())
    }

    async fn load(&self) -> Result<Vec<Event>, AppError> {
        if self.gateway.credentials().get().await.is_none() {
            return Err(AppError::missing_credential());
        }
        let response = self.gateway.post(EVENTS_PATH, None, true).await?;
        parse_events(&response.body)
    }
}
