//! Access/refresh token pair

use std::fmt;

use serde::{Deserialize, Serialize};

/// The bearer token pair issued by the auth service.
///
/// Both tokens are opaque strings; the client never inspects their
/// contents. `Debug` only prints a short preview of each token so the pair
/// can be logged safely.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    access_token: String,
    refresh_token: String,
}

impl Credentials {
    /// Creates a new credential pair.
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// The short-lived token sent with every API call.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the refresh token, or `None` if it is blank.
    #[must_use]
    pub fn usable_refresh_token(&self) -> Option<&str> {
        let token = self.refresh_token.trim();
        (!token.is_empty()).then_some(token)
    }

    /// Get a preview of a token (first 8 chars + ...).
    #[must_use]
    pub fn token_preview(token: &str) -> String {
        match token.char_indices().nth(8) {
            Some((idx, _)) if token.len() > 12 => format!("{}...", &token[..idx]),
            _ => token.to_string(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &Self::token_preview(&self.access_token))
            .field("refresh_token", &Self::token_preview(&self.refresh_token))
            .finish()
    }
}
