use std::sync::Arc;

use anyhow::Result;
use plie_core::config::Config;
use plie_core::credentials::{CredentialStore, Credentials, FileCredentialStore};
use plie_core::gateway::Gateway;

use crate::listing::EventsLifecycle;
use crate::session::AuthLifecycle;
use crate::state::AuthStatus;
use crate::store::Store;

/// The wired client: one store, one gateway, both lifecycles.
#[derive(Debug, Clone)]
pub struct App {
    store: Store,
    auth: AuthLifecycle,
    events: EventsLifecycle,
}

impl App {
    /// Builds the client with the file-backed credential store from `config`.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be built.
    pub fn new(config: &Config) -> Result<Self> {
        let store = FileCredentialStore::new(config.credentials_path());
        Self::with_parts(config, Arc::new(store))
    }

    /// Builds the client around an arbitrary credential store.
    ///
    /// # Errors
    /// See [`App::new`].
    pub fn with_parts(config: &Config, credentials: Arc<dyn CredentialStore>) -> Result<Self> {
        let store = Store::default();
        let credentials = Credentials::new(credentials).with_timeout(config.storage_timeout());
        let gateway = Gateway::from_config(config, credentials)?
            .with_unauthorized_hook(AuthLifecycle::unauthorized_hook(store.clone()));

        Ok(Self {
            auth: AuthLifecycle::new(store.clone(), gateway.clone()),
            events: EventsLifecycle::new(store.clone(), gateway),
            store,
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn auth(&self) -> &AuthLifecycle {
        &self.auth
    }

    pub fn events(&self) -> &EventsLifecycle {
        &self.events
    }

    /// Startup flow: restore the session, then load events if logged in.
    ///
    /// A failed fetch is recorded in the `events` slice and does not fail
    /// the bootstrap.
    pub async fn bootstrap(&self) -> AuthStatus {
        let status = self.auth.check_session().await;
        if status == AuthStatus::Authenticated
            && let Err(err) = self.events.fetch_events().await
        {
            tracing::debug!(error = %err, "initial events fetch failed");
        }
        self.auth.status()
    }
}

#[cfg(test)]
mod tests {
    use plie_core::credentials::MemoryCredentialStore;
    use serde_json::json;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::state::FetchStatus;

    fn config_for(server: &MockServer) -> Config {
        let mut config = Config::default();
        config.api.base_url = server.uri();
        config
    }

    #[tokio::test]
    async fn test_bootstrap_with_token_loads_events() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/events-listing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "1"}])))
            .expect(1)
            .mount(&server)
            .await;

        let app = App::with_parts(
            &config_for(&server),
            Arc::new(MemoryCredentialStore::with_token("abc")),
        )
        .unwrap();

        assert_eq!(app.bootstrap().await, AuthStatus::Authenticated);
        assert_eq!(app.events().status(), FetchStatus::Loaded);
        assert_eq!(app.store().snapshot().events.items.len(), 1);
    }

    #[tokio::test]
    async fn test_bootstrap_without_token_skips_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let app = App::with_parts(&config_for(&server), Arc::new(MemoryCredentialStore::new()))
            .unwrap();

        assert_eq!(app.bootstrap().await, AuthStatus::Anonymous);
        assert_eq!(app.events().status(), FetchStatus::Idle);
    }

    #[tokio::test]
    async fn test_bootstrap_with_rejected_token_ends_anonymous() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let app = App::with_parts(
            &config_for(&server),
            Arc::new(MemoryCredentialStore::with_token("expired")),
        )
        .unwrap();

        assert_eq!(app.bootstrap().await, AuthStatus::Anonymous);
        assert_eq!(app.events().status(), FetchStatus::FetchFailed);
    }

    #[tokio::test]
    async fn test_file_backed_session_survives_restart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "abc"})))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let mut config = config_for(&server);
        config.storage.credentials_file =
            Some(dir.path().join("credentials.json").display().to_string());

        let first = App::new(&config).unwrap();
        first.auth().login("a@b.com", "pw").await.unwrap();

        let second = App::new(&config).unwrap();
        assert_eq!(second.auth().check_session().await, AuthStatus::Authenticated);

        second.auth().logout().await.unwrap();
        let third = App::new(&config).unwrap();
        assert_eq!(third.auth().check_session().await, AuthStatus::Anonymous);
    }
}
