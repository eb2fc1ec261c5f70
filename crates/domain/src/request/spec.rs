//! API request descriptor

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::{HttpMethod, RequestOptions};
use crate::error::{DomainError, DomainResult};

/// A call against the practicum API, relative to the configured base URL.
///
/// The descriptor is kept verbatim for the lifetime of the call so that a
/// retry after a token refresh resends the same method, path, headers,
/// query and body. Only the bearer token is replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Path relative to the base URL (e.g. `/projects`)
    pub path: String,
    /// Optional JSON body
    #[serde(default)]
    pub body: Option<Value>,
    /// Extra headers and query parameters
    #[serde(default)]
    pub options: RequestOptions,
}

impl ApiRequest {
    /// Creates a request without body or options.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            options: RequestOptions::default(),
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Creates a POST request with a JSON body.
    #[must_use]
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Post, path).with_body(body)
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Replaces the per-call options.
    #[must_use]
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Joins the path onto `base_url`, keeping the base URL's own path.
    ///
    /// `http://host/api` + `/projects` gives `http://host/api/projects`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidUrl` if the joined URL does not parse.
    pub fn url(&self, base_url: &str) -> DomainResult<String> {
        let joined = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        );
        match Url::parse(&joined) {
            Ok(_) => Ok(joined),
            Err(e) => Err(DomainError::InvalidUrl {
                url: joined,
                reason: e.to_string(),
            }),
        }
    }

    /// Returns the headers to send, with the bearer token applied.
    ///
    /// Any caller-supplied `Authorization` header is replaced when a token is
    /// present and kept otherwise.
    #[must_use]
    pub fn headers_with_bearer(&self, access_token: Option<&str>) -> Vec<(String, String)> {
        let mut headers: Vec<(String, String)> = self.options.headers.clone();
        if let Some(token) = access_token {
            headers.retain(|(name, _)| !name.eq_ignore_ascii_case("authorization"));
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        headers
    }

    /// Validates the request descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid header names or values.
    pub fn validate(&self) -> DomainResult<()> {
        self.options.validate()
    }
}
