//! Client settings loading.
//!
//! Settings are resolved in order: built-in defaults, then the optional
//! settings file, then the `PRACTICUM_API_URL` environment variable. The
//! default file lives in the platform config directory:
//! - Linux/macOS: ~/.config/practicum/settings.json
//! - Windows: %APPDATA%/practicum/settings.json

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use practicum_domain::{ClientSettings, DomainError};
use tokio::fs;
use tracing::debug;

use crate::serialization::{SerializationError, from_json_bytes, to_json_pretty_bytes};

/// Environment variable overriding the API base URL.
pub const API_URL_ENV: &str = "PRACTICUM_API_URL";

/// Error type for settings operations.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    /// The resolved settings are unusable.
    #[error("Invalid settings: {0}")]
    Invalid(#[from] DomainError),

    /// Could not determine config directory.
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Loads and saves [`ClientSettings`].
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    path: Option<PathBuf>,
}

impl Default for SettingsRepository {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
        }
    }
}

impl SettingsRepository {
    /// Creates a repository using the default settings file.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository reading the settings file at `path`.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Returns the default settings file path, if available.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("practicum").join("settings.json"))
    }

    /// Returns the settings file this repository reads, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Resolves the settings from defaults, file and environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if the resolved settings are invalid.
    pub async fn load(&self) -> Result<ClientSettings, SettingsError> {
        let settings = self.load_file().await?;
        let settings = apply_env_override(settings, std::env::var(API_URL_ENV).ok());
        settings.validate()?;

        debug!(
            base_url = %settings.base_url,
            timeout_secs = settings.timeout_secs,
            "resolved client settings"
        );
        Ok(settings)
    }

    /// Reads the settings file without applying the environment.
    ///
    /// Returns defaults if there is no file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load_file(&self) -> Result<ClientSettings, SettingsError> {
        let Some(path) = &self.path else {
            return Ok(ClientSettings::default());
        };

        match fs::read(path).await {
            Ok(content) => Ok(from_json_bytes(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(ClientSettings::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes settings to the settings file.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid or the file cannot be
    /// written.
    pub async fn save(&self, settings: &ClientSettings) -> Result<(), SettingsError> {
        settings.validate()?;
        let Some(path) = &self.path else {
            return Err(SettingsError::NoConfigDir);
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, to_json_pretty_bytes(settings)?).await?;
        Ok(())
    }
}

/// Applies the `PRACTICUM_API_URL` value, ignoring it when blank.
#[must_use]
pub fn apply_env_override(mut settings: ClientSettings, api_url: Option<String>) -> ClientSettings {
    if let Some(url) = api_url.filter(|url| !url.trim().is_empty()) {
        settings.base_url = url.trim().to_string();
    }
    settings
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_settings_path_is_valid() {
        if let Some(path) = SettingsRepository::default_path() {
            assert!(path.ends_with("practicum/settings.json"));
        }
    }

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let repo = SettingsRepository::with_path(dir.path().join("settings.json"));

        assert_eq!(repo.load_file().await.unwrap(), ClientSettings::default());
    }

    #[tokio::test]
    async fn test_partial_file_keeps_remaining_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, br#"{"baseUrl": "https://practicum.example.edu/api"}"#).unwrap();

        let settings = SettingsRepository::with_path(&path).load_file().await.unwrap();

        assert_eq!(settings.base_url, "https://practicum.example.edu/api");
        assert_eq!(settings.timeout_secs, 10);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let repo = SettingsRepository::with_path(dir.path().join("cfg").join("settings.json"));
        let settings = ClientSettings::new("https://api.example.edu")
            .with_timeout(std::time::Duration::from_secs(30));

        repo.save(&settings).await.unwrap();

        assert_eq!(repo.load_file().await.unwrap(), settings);
    }

    #[tokio::test]
    async fn test_save_rejects_invalid_settings() {
        let dir = TempDir::new().unwrap();
        let repo = SettingsRepository::with_path(dir.path().join("settings.json"));

        let result = repo.save(&ClientSettings::new("ftp://example.edu")).await;

        assert!(matches!(result, Err(SettingsError::Invalid(_))));
        assert!(!dir.path().join("settings.json").exists());
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, b"baseUrl=nope").unwrap();

        let result = SettingsRepository::with_path(&path).load_file().await;
        assert!(matches!(result, Err(SettingsError::Serialization(_))));
    }

    #[test]
    fn test_env_override_wins_over_file() {
        let settings = apply_env_override(
            ClientSettings::new("https://from-file.example.edu/api"),
            Some("https://from-env.example.edu/api".to_string()),
        );
        assert_eq!(settings.base_url, "https://from-env.example.edu/api");
    }

    #[test]
    fn test_blank_env_override_is_ignored() {
        let settings = apply_env_override(ClientSettings::default(), Some("  ".to_string()));
        assert_eq!(settings, ClientSettings::default());

        let settings = apply_env_override(ClientSettings::default(), None);
        assert_eq!(settings, ClientSettings::default());
    }
}
