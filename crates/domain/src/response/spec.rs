//! API response type

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A completed call against the practicum API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers, lower-cased names
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Parsed JSON body
    pub body: Value,
    /// Time spent on the attempt that produced this response
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

impl ApiResponse {
    /// Builds a response from raw transport data.
    #[must_use]
    pub fn from_raw(
        status: u16,
        headers: BTreeMap<String, String>,
        body: &[u8],
        duration: Duration,
    ) -> Self {
        Self {
            status,
            headers,
            body: parse_body(body),
            duration,
        }
    }

    /// Returns true if the status code indicates success (2xx).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns a header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Deserializes the body into `T`.
    ///
    /// # Errors
    ///
    /// Returns the serde error if the body does not match `T`.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.body)
    }
}

/// Parses a response body as JSON.
///
/// An empty body is `null`; a body that is not JSON is kept as a JSON string
/// so error messages from proxies still reach the caller.
#[must_use]
pub fn parse_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[allow(clippy::cast_possible_truncation)]
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_body_variants() {
        assert_eq!(parse_body(b""), Value::Null);
        assert_eq!(parse_body(b"  \n"), Value::Null);
        assert_eq!(parse_body(br#"{"id": 1}"#), json!({"id": 1}));
        assert_eq!(
            parse_body(b"Bad Gateway"),
            Value::String("Bad Gateway".to_string())
        );
    }

    #[test]
    fn test_typed_body() {
        #[derive(Debug, PartialEq, Deserialize)]
        struct Team {
            id: u32,
            name: String,
        }

        let response = ApiResponse::from_raw(
            200,
            BTreeMap::new(),
            br#"{"id": 3, "name": "Orion"}"#,
            Duration::from_millis(12),
        );
        assert!(response.is_success());
        assert_eq!(
            response.json::<Team>().unwrap(),
            Team {
                id: 3,
                name: "Orion".to_string()
            }
        );
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        let response = ApiResponse::from_raw(204, headers, b"", Duration::ZERO);
        assert_eq!(response.header("Content-Type"), Some("application/json"));
        assert_eq!(response.body, Value::Null);
    }
}
