//! Single point of egress for HTTP calls to the events API.
//!
//! The gateway attaches the cached bearer token, enforces the per-request
//! timeout and normalizes every failure into an `AppError`.
//!
//! ## Authorization failures
//!
//! Any response with status 401 invalidates the session: the gateway clears
//! the cached and stored token and then runs the `UnauthorizedHook`, if one
//! was installed with [`Gateway::with_unauthorized_hook`]. This happens for
//! every caller, regardless of which endpoint was hit. The gateway never
//! retries and never navigates.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::future::BoxFuture;
pub use reqwest::Method;
use reqwest::header::ACCEPT;
use serde_json::Value;

use crate::config::Config;
use crate::credentials::{Credentials, redact_token};
use crate::error::AppError;

/// Standard User-Agent header for Plié API requests.
pub const USER_AGENT: &str = concat!("plie/", env!("CARGO_PKG_VERSION"));

/// Max characters of a request/response body written to debug logs.
const LOG_BODY_LIMIT: usize = 500;

/// Form fields never written to logs.
const SENSITIVE_FIELDS: &[&str] = &["password"];

/// JSON keys whose string values are logged only as a redacted prefix.
const TOKEN_FIELDS: &[&str] = &["token", "authToken", "access_token"];

/// Callback run after a 401 has cleared the stored credential.
pub type UnauthorizedHook = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Wraps an async closure into an [`UnauthorizedHook`].
pub fn unauthorized_hook<F, Fut>(f: F) -> UnauthorizedHook
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move || Box::pin(f()))
}

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// `application/x-www-form-urlencoded` fields, in order
    Form(Vec<(String, String)>),
    /// JSON document
    Json(Value),
}

impl RequestBody {
    pub fn form<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::Form(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    fn log_preview(&self) -> String {
        match self {
            RequestBody::Form(fields) => {
                let shown: Vec<String> = fields
                    .iter()
                    .map(|(k, v)| {
                        if SENSITIVE_FIELDS.contains(&k.as_str()) {
                            format!("{k}=***")
                        } else {
                            format!("{k}={v}")
                        }
                    })
                    .collect();
                truncate_for_log(&shown.join("&"))
            }
            RequestBody::Json(value) => truncate_for_log(&redact_json(value.clone()).to_string()),
        }
    }
}

/// Successful (2xx) response with its parsed JSON body.
///
/// An empty body is represented as `Value::Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

/// HTTP gateway for the events API.
#[derive(Clone)]
pub struct Gateway {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    on_unauthorized: Option<UnauthorizedHook>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("base_url", &self.base_url)
            .field("has_unauthorized_hook", &self.on_unauthorized.is_some())
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Creates a gateway for `base_url` with a fixed per-request timeout.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        credentials: Credentials,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            on_unauthorized: None,
        })
    }

    /// Creates a gateway from config (base URL with env override, timeout).
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the client cannot be built.
    pub fn from_config(config: &Config, credentials: Credentials) -> Result<Self> {
        let base_url = config.effective_base_url()?;
        Self::new(base_url, config.request_timeout(), credentials)
    }

    /// Installs the callback run after any 401.
    #[must_use]
    pub fn with_unauthorized_hook(mut self, hook: UnauthorizedHook) -> Self {
        self.on_unauthorized = Some(hook);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Sends a request and returns the parsed 2xx response.
    ///
    /// When `requires_auth` is set, the cached token is attached as a bearer
    /// credential. A missing token is not checked here; callers that need
    /// one check before calling.
    ///
    /// # Errors
    /// - `Timeout` / `Network` for transport failures
    /// - `AuthRejected` for 401 (after the credential has been cleared)
    /// - `HttpStatus` for other non-2xx statuses
    /// - `MalformedResponse` for a 2xx body that is not JSON
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
        requires_auth: bool,
    ) -> Result<ApiResponse, AppError> {
        let url = self.url(path);

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(ACCEPT, "application/json");

        let mut token_preview = None;
        if requires_auth {
            match self.credentials.cached() {
                Some(token) => {
                    token_preview = Some(redact_token(&token));
                    request = request.bearer_auth(token);
                }
                None => tracing::debug!(%url, "no cached token for authenticated request"),
            }
        }

        tracing::debug!(
            %method,
            %url,
            token = token_preview.as_deref().unwrap_or("-"),
            body = %body.as_ref().map(RequestBody::log_preview).unwrap_or_default(),
            "api request"
        );

        request = match &body {
            Some(RequestBody::Form(fields)) => request.form(fields),
            Some(RequestBody::Json(value)) => request.json(value),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            let err = classify_reqwest_error(&e);
            tracing::debug!(%url, error = %err, "api request failed");
            err
        })?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;
        tracing::debug!(%url, status, body = %response_preview(&text), "api response");

        let parsed = parse_body(&text);

        if status == 401 {
            self.invalidate_session().await;
        }

        if !(200..300).contains(&status) {
            let body = parsed.unwrap_or(Value::Null);
            return Err(AppError::http_status(status, &body));
        }

        let body = parsed.ok_or_else(|| AppError::malformed("Failed to parse response"))?;
        Ok(ApiResponse { status, body })
    }

    /// Convenience for `POST`.
    ///
    /// # Errors
    /// See [`Gateway::request`].
    pub async fn post(
        &self,
        path: &str,
        body: Option<RequestBody>,
        requires_auth: bool,
    ) -> Result<ApiResponse, AppError> {
        self.request(Method::POST, path, body, requires_auth).await
    }

    async fn invalidate_session(&self) {
        tracing::info!("server rejected credentials (401); clearing stored token");
        self.credentials.clear_cached();
        if let Err(err) = self.credentials.clear().await {
            tracing::warn!(error = %err, "failed to clear stored token after 401");
        }
        if let Some(hook) = &self.on_unauthorized {
            hook().await;
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Parses a response body. Empty bodies become `Null`; invalid JSON is `None`.
fn parse_body(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return Some(Value::Null);
    }
    serde_json::from_str(text).ok()
}

/// Classifies a reqwest error into an `AppError`.
fn classify_reqwest_error(e: &reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::timeout("Request timed out")
    } else if e.is_connect() {
        AppError::network(format!("Connection failed: {e}"))
    } else if e.is_decode() || e.is_body() {
        AppError::malformed(format!("Failed to read response: {e}"))
    } else {
        AppError::network(format!("Network error: {e}"))
    }
}

/// Log form of a response body with token values redacted.
///
/// Bodies that are not JSON are logged as-is (truncated).
fn response_preview(text: &str) -> String {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => truncate_for_log(&redact_json(value).to_string()),
        Err(_) => truncate_for_log(text),
    }
}

/// Replaces every string under a token key, at any depth.
fn redact_json(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| match value {
                    Value::String(token) if TOKEN_FIELDS.contains(&key.as_str()) => {
                        (key, Value::String(redact_token(&token)))
                    }
                    other => (key, redact_json(other)),
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(redact_json).collect()),
        other => other,
    }
}

fn truncate_for_log(text: &str) -> String {
    if text.chars().count() <= LOG_BODY_LIMIT {
        return text.to_string();
    }
    let head: String = text.chars().take(LOG_BODY_LIMIT).collect();
    format!("{head}...")
}
