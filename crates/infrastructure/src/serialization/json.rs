//! JSON helpers for the files the client keeps on disk.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::{PrettyFormatter, Serializer};

/// Error type for serialization operations.
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// JSON serialization failed.
    #[error("JSON serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// JSON deserialization failed.
    #[error("JSON deserialization failed: {0}")]
    Deserialize(serde_json::Error),
}

/// Serializes a value to pretty JSON bytes.
///
/// Output uses 2-space indentation and ends with a newline, so files stay
/// readable when inspected by hand.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json_pretty_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, SerializationError> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"  ");
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;

    buffer.push(b'\n');
    Ok(buffer)
}

/// Deserializes JSON from bytes.
///
/// # Errors
///
/// Returns an error if the JSON is invalid or doesn't match the expected type.
pub fn from_json_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SerializationError> {
    serde_json::from_slice(bytes).map_err(SerializationError::Deserialize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use practicum_domain::ClientSettings;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pretty_output_has_indent_and_trailing_newline() {
        let bytes = to_json_pretty_bytes(&ClientSettings::default()).expect("serialize");
        let json = String::from_utf8(bytes).expect("utf-8");

        assert!(json.ends_with("}\n"));
        assert!(json.contains("  \"baseUrl\""));
    }

    #[test]
    fn test_settings_survive_disk_format() {
        let settings = ClientSettings::new("https://practicum.example.edu/api");
        let bytes = to_json_pretty_bytes(&settings).expect("serialize");
        let restored: ClientSettings = from_json_bytes(&bytes).expect("deserialize");
        assert_eq!(restored, settings);
    }

    #[test]
    fn test_invalid_bytes_are_rejected() {
        let result: Result<ClientSettings, _> = from_json_bytes(b"{\"baseUrl\": }");
        assert!(matches!(result, Err(SerializationError::Deserialize(_))));
    }
}
