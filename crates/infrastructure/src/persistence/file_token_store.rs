//! File-backed token storage.
//!
//! The credential pair is kept in the platform data directory:
//! - Linux: ~/.local/share/practicum/session.json
//! - macOS: ~/Library/Application Support/practicum/session.json
//! - Windows: %APPDATA%/practicum/session.json

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use practicum_application::ports::{TokenStore, TokenStoreError};
use practicum_domain::Credentials;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use crate::serialization::{from_json_bytes, to_json_pretty_bytes};

/// On-disk layout of the session file.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    #[serde(flatten)]
    credentials: Credentials,
    updated_at: DateTime<Utc>,
}

/// Token store persisting the credential pair as a JSON file:
/// ```json
/// {
///   "accessToken": "eyJhbGciOi...",
///   "refreshToken": "eyJhbGciOi...",
///   "updatedAt": "2024-09-01T12:00:00Z"
/// }
/// ```
///
/// Writes go to a sibling temp file which is then renamed over the session
/// file, so readers never observe one token without the other.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Creates a store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store in the platform data directory.
    ///
    /// Returns `None` if the data directory cannot be determined.
    #[must_use]
    pub fn default_location() -> Option<Self> {
        Self::default_path().map(Self::new)
    }

    /// Returns the default session file path, if available.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("practicum").join("session.json"))
    }

    /// Returns the file this store writes to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<Credentials>, TokenStoreError> {
        let content = match fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let stored: StoredSession = from_json_bytes(&content)
            .map_err(|e| TokenStoreError::Serialization(e.to_string()))?;
        Ok(Some(stored.credentials))
    }

    async fn save(&self, credentials: &Credentials) -> Result<(), TokenStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = to_json_pretty_bytes(&StoredSession {
            credentials: credentials.clone(),
            updated_at: Utc::now(),
        })
        .map_err(|e| TokenStoreError::Serialization(e.to_string()))?;

        let temp = self.temp_path();
        fs::write(&temp, content).await?;
        restrict_permissions(&temp).await?;
        fs::rename(&temp, &self.path).await?;

        debug!(path = %self.path.display(), "stored session tokens");
        Ok(())
    }

    async fn clear(&self) -> Result<(), TokenStoreError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "removed session tokens");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> FileTokenStore {
        FileTokenStore::new(dir.path().join("nested").join("session.json"))
    }

    #[test]
    fn test_default_path() {
        if let Some(path) = FileTokenStore::default_path() {
            assert!(path.ends_with("practicum/session.json"));
        }
    }

    #[tokio::test]
    async fn test_missing_file_reads_as_signed_out() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_creates_directories_and_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.save(&Credentials::new("T1", "R1")).await.unwrap();

        assert_eq!(
            store.load().await.unwrap(),
            Some(Credentials::new("T1", "R1"))
        );
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn test_file_layout() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save(&Credentials::new("T1", "R1")).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(store.path()).unwrap()).unwrap();

        assert_eq!(raw["accessToken"], "T1");
        assert_eq!(raw["refreshToken"], "R1");
        assert!(raw["updatedAt"].is_string());
    }

    #[tokio::test]
    async fn test_save_replaces_both_tokens() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.save(&Credentials::new("T1", "R1")).await.unwrap();
        store.save(&Credentials::new("T2", "R2")).await.unwrap();

        assert_eq!(
            store.load().await.unwrap(),
            Some(Credentials::new("T2", "R2"))
        );
    }

    #[tokio::test]
    async fn test_clear_removes_file_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save(&Credentials::new("T1", "R1")).await.unwrap();

        store.clear().await.unwrap();
        store.clear().await.unwrap();

        assert!(!store.path().exists());
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_serialization_error() {
        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path().join("session.json"));
        std::fs::write(store.path(), b"{not json").unwrap();

        assert!(matches!(
            store.load().await,
            Err(TokenStoreError::Serialization(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_session_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save(&Credentials::new("T1", "R1")).await.unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
