//! Client settings
//!
//! The only tunables of the client: where the API lives and how long a
//! single HTTP call may take.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DomainError, DomainResult};

/// Default API origin used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";

/// Default per-call timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Settings for the authenticated API client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientSettings {
    /// Base URL every request path is joined onto.
    pub base_url: String,
    /// Timeout applied to each individual HTTP call, in seconds.
    pub timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientSettings {
    /// Creates settings for the given base URL with the default timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Sets the per-call timeout.
    ///
    /// The timeout is kept in whole seconds: fractions are dropped and
    /// anything below one second becomes one second.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Per-call timeout as a `Duration`.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Checks that the base URL is an absolute http(s) URL and the timeout
    /// is non-zero.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidUrl` for a bad base URL and
    /// `DomainError::ZeroTimeout` for a zero timeout.
    pub fn validate(&self) -> DomainResult<()> {
        let url = Url::parse(&self.base_url).map_err(|e| DomainError::InvalidUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DomainError::InvalidUrl {
                url: self.base_url.clone(),
                reason: "scheme must be http or https".to_string(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(DomainError::ZeroTimeout);
        }
        Ok(())
    }
}
