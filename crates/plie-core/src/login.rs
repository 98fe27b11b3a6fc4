//! Login request/response wire format.
//!
//! The server's success shape is not fixed, so token extraction walks an
//! ordered list of accepted shapes and takes the first non-empty token:
//!
//! 1. `{ "data": { "token": "...", ...profile } }`
//! 2. `{ "token": "...", ...profile }`

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::gateway::RequestBody;

pub const LOGIN_PATH: &str = "/login";

/// Shown when the server gives no `message` for a failed login.
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please check your credentials.";

/// User profile returned by the login endpoint.
///
/// Kept as the server sent it (minus the token); only a few fields are
/// read by the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile(pub Map<String, Value>);

impl UserProfile {
    pub fn name(&self) -> Option<&str> {
        self.str_field("usr_fname")
            .or_else(|| self.str_field("name"))
            .or_else(|| self.str_field("first_name"))
    }

    pub fn email(&self) -> Option<&str> {
        self.str_field("usr_email")
            .or_else(|| self.str_field("email"))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginPayload {
    pub token: String,
    pub user: UserProfile,
}

/// Accepted locations of the token, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenShape {
    NestedData,
    TopLevel,
}

const TOKEN_SHAPES: &[TokenShape] = &[TokenShape::NestedData, TokenShape::TopLevel];

impl TokenShape {
    /// Returns the object holding the token for this shape, if present.
    fn container(self, body: &Value) -> Option<&Map<String, Value>> {
        match self {
            TokenShape::NestedData => body.get("data").and_then(Value::as_object),
            TokenShape::TopLevel => body.as_object(),
        }
    }
}

/// Builds the form body for `POST /login`.
pub fn login_form(email: &str, password: &str) -> RequestBody {
    RequestBody::form([("email", email), ("password", password)])
}

/// Extracts the token and profile from a login response body.
///
/// # Errors
/// Returns `MalformedResponse` if no accepted shape yields a non-empty token.
pub fn extract_login(body: &Value) -> Result<LoginPayload, AppError> {
    for shape in TOKEN_SHAPES {
        let Some(container) = shape.container(body) else {
            continue;
        };
        let Some(token) = container
            .get("token")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
        else {
            continue;
        };

        let mut profile = container.clone();
        profile.remove("token");
        return Ok(LoginPayload {
            token: token.to_string(),
            user: UserProfile(profile),
        });
    }

    Err(AppError::malformed("No token received from server"))
}
