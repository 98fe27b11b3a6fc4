//! Application state layer for the Plié client.
//!
//! A single [`store::Store`] holds the `auth` and `events` slices. The two
//! lifecycles ([`session::AuthLifecycle`], [`listing::EventsLifecycle`])
//! perform I/O through the gateway and report progress by dispatching
//! [`actions::Action`]s; the pure reducer in [`update`] is the only code that
//! writes state.

pub mod actions;
mod app;
pub mod listing;
pub mod session;
pub mod state;
pub mod store;
pub mod task;
pub mod update;

pub use app::App;
pub use state::{AppState, AuthStatus, EventsState, FetchStatus, Session};
pub use store::Store;
