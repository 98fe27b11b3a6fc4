//! Structured errors shared by the gateway and the lifecycles.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Categories of client errors for consistent handling in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Transport failure (DNS, connect, reset)
    Network,
    /// Request exceeded the gateway timeout
    Timeout,
    /// Non-2xx status on a resource call (other than 401)
    HttpStatus,
    /// Login rejected, or any 401 on an authenticated call
    AuthRejected,
    /// A protected action was attempted without a stored token
    MissingCredential,
    /// Credential storage could not be written or cleared
    Storage,
    /// Success status but the body did not have an accepted shape
    MalformedResponse,
    /// Another login attempt is already in flight
    Busy,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Network => write!(f, "network"),
            ErrorKind::Timeout => write!(f, "timeout"),
            ErrorKind::HttpStatus => write!(f, "http_status"),
            ErrorKind::AuthRejected => write!(f, "auth_rejected"),
            ErrorKind::MissingCredential => write!(f, "missing_credential"),
            ErrorKind::Storage => write!(f, "storage"),
            ErrorKind::MalformedResponse => write!(f, "malformed_response"),
            ErrorKind::Busy => write!(f, "busy"),
        }
    }
}

/// Uniform error shape: `{ kind, message, status_code? }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppError {
    /// Error category
    pub kind: ErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// HTTP status when the server answered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
        }
    }

    /// Creates an error for a non-2xx response.
    ///
    /// 401 maps to `AuthRejected`; the message prefers the body's `message`
    /// field and falls back to `HTTP <status>`.
    pub fn http_status(status: u16, body: &Value) -> Self {
        let kind = if status == 401 {
            ErrorKind::AuthRejected
        } else {
            ErrorKind::HttpStatus
        };
        let message = server_message(body).unwrap_or_else(|| format!("HTTP {status}"));
        Self {
            kind,
            message,
            status_code: Some(status),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedResponse, message)
    }

    pub fn missing_credential() -> Self {
        Self::new(
            ErrorKind::MissingCredential,
            "Authentication token not found",
        )
    }

    /// True when the server answered without a usable `message`, so the
    /// text is the `HTTP <status>` placeholder.
    pub fn is_status_fallback(&self) -> bool {
        self.status_code
            .is_some_and(|status| self.message == format!("HTTP {status}"))
    }

    /// Returns true if the user should be sent back to the login screen.
    pub fn requires_login(&self) -> bool {
        match self.kind {
            ErrorKind::MissingCredential => true,
            ErrorKind::AuthRejected => self.status_code == Some(401),
            _ => false,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        Self::new(ErrorKind::Storage, err.to_string())
    }
}

/// Failure of the underlying credential storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageError {
    pub message: String,
}

impl StorageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential storage error: {}", self.message)
    }
}

impl std::error::Error for StorageError {}

/// Extracts the server-provided `message` field, if any.
pub fn server_message(body: &Value) -> Option<String> {
    body.get("message")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|msg| !msg.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_http_status_prefers_server_message() {
        let err = AppError::http_status(401, &json!({"message": "Invalid credentials"}));
        assert_eq!(err.kind, ErrorKind::AuthRejected);
        assert_eq!(err.message, "Invalid credentials");
        assert_eq!(err.status_code, Some(401));
        assert!(!err.is_status_fallback());
        assert!(err.requires_login());
    }

    #[test]
    fn test_http_status_falls_back_to_status_text() {
        let err = AppError::http_status(503, &Value::Null);
        assert_eq!(err.kind, ErrorKind::HttpStatus);
        assert_eq!(err.message, "HTTP 503");
        assert!(err.is_status_fallback());
        assert!(!err.requires_login());
    }

    #[test]
    fn test_blank_server_message_is_ignored() {
        assert_eq!(server_message(&json!({"message": "   "})), None);
    }

    #[test]
    fn test_storage_error_converts_to_storage_kind() {
        let err: AppError = StorageError::new("disk full").into();
        assert_eq!(err.kind, ErrorKind::Storage);
        assert!(err.message.contains("disk full"));
    }

    #[test]
    fn test_missing_credential_requires_login() {
        assert!(AppError::missing_credential().requires_login());
    }
}
