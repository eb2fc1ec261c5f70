//! Per-call request options

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Extra headers and query parameters for a single call.
///
/// Order is preserved so retries resend exactly what the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RequestOptions {
    /// Additional request headers
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Query parameters appended to the URL
    #[serde(default)]
    pub query: Vec<(String, String)>,
}

impl RequestOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Checks header names and values for characters HTTP does not allow.
    ///
    /// Values reject every ASCII control byte except tab.
    ///
    /// # Errors
    ///
    /// Returns the first offending header name or value.
    pub fn validate(&self) -> DomainResult<()> {
        for (name, value) in &self.headers {
            let valid_name = !name.is_empty()
                && name
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b));
            if !valid_name {
                return Err(DomainError::InvalidHeaderName(name.clone()));
            }
            if value
                .bytes()
                .any(|b| (b < 0x20 && b != b'\t') || b == 0x7f)
            {
                return Err(DomainError::InvalidHeaderValue(name.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builder_preserves_order() {
        let options = RequestOptions::new()
            .header("X-A", "1")
            .header("X-B", "2")
            .query("semester", "2024-fall");

        assert_eq!(
            options.headers,
            vec![
                ("X-A".to_string(), "1".to_string()),
                ("X-B".to_string(), "2".to_string())
            ]
        );
        assert_eq!(options.query.len(), 1);
    }

    #[test]
    fn test_validate_rejects_bad_header_name() {
        let options = RequestOptions::new().header("Bad Header", "x");
        assert_eq!(
            options.validate(),
            Err(DomainError::InvalidHeaderName("Bad Header".to_string()))
        );
    }

    #[test]
    fn test_validate_rejects_newline_in_value() {
        let options = RequestOptions::new().header("X-Trace", "a\r\nb");
        assert!(matches!(
            options.validate(),
            Err(DomainError::InvalidHeaderValue(_))
        ));
    }

    #[test]
    fn test_validate_rejects_control_bytes_in_value() {
        for value in ["a\u{1}b", "\u{7f}", "x\u{1b}[0m"] {
            let options = RequestOptions::new().header("X-A", value);
            assert_eq!(
                options.validate(),
                Err(DomainError::InvalidHeaderValue("X-A".to_string())),
                "{value:?}"
            );
        }
    }

    #[test]
    fn test_validate_accepts_tab_and_non_ascii_value() {
        let options = RequestOptions::new()
            .header("X-A", "a\tb")
            .header("X-Name", "Zoë");
        assert_eq!(options.validate(), Ok(()));
    }
}
