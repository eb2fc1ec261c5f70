//! Wire messages exchanged with the auth service.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Credentials;

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

impl LoginRequest {
    /// Creates a login request body.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Profile of the signed-in user as returned by the login endpoint.
///
/// Only the fields the client cares about are typed; everything else the
/// backend sends is preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct User {
    /// Backend identifier (numeric or string depending on the backend)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Account email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Role in the practicum (student, mentor, admin, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Remaining profile fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Success body of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// New access token
    pub access_token: String,
    /// New refresh token
    pub refresh_token: String,
    /// Signed-in user profile
    #[serde(default)]
    pub user: Option<User>,
}

impl LoginResponse {
    /// Splits the response into the credential pair and the user profile.
    #[must_use]
    pub fn into_parts(self) -> (Credentials, Option<User>) {
        (
            Credentials::new(self.access_token, self.refresh_token),
            self.user,
        )
    }
}

/// Body of `POST /auth/refresh`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// The stored refresh token
    pub refresh_token: String,
}

/// Success body of `POST /auth/refresh`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    /// Replacement access token
    pub access_token: String,
    /// Rotated refresh token, if the backend rotates them
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl RefreshResponse {
    /// Builds the credentials to store after a refresh.
    ///
    /// A response without a refresh token keeps `previous_refresh`.
    #[must_use]
    pub fn into_credentials(self, previous_refresh: &str) -> Credentials {
        let refresh = self
            .refresh_token
            .filter(|token| !token.trim().is_empty())
            .unwrap_or_else(|| previous_refresh.to_string());
        Credentials::new(self.access_token, refresh)
    }
}
