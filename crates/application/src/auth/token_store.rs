//! In-memory token storage.

use std::sync::Arc;

use async_trait::async_trait;
use practicum_domain::Credentials;
use tokio::sync::RwLock;

use crate::ports::{TokenStore, TokenStoreError};

/// Thread-safe in-memory token store.
///
/// Nothing survives a restart; use the file-backed store from the
/// infrastructure crate for that.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    credentials: Arc<RwLock<Option<Credentials>>>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `credentials`.
    #[must_use]
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            credentials: Arc::new(RwLock::new(Some(credentials))),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<Credentials>, TokenStoreError> {
        Ok(self.credentials.read().await.clone())
    }

    async fn save(&self, credentials: &Credentials) -> Result<(), TokenStoreError> {
        *self.credentials.write().await = Some(credentials.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), TokenStoreError> {
        *self.credentials.write().await = None;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_save_and_load() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.load().await.unwrap(), None);

        store.save(&Credentials::new("T1", "R1")).await.unwrap();
        assert_eq!(
            store.load().await.unwrap(),
            Some(Credentials::new("T1", "R1"))
        );
    }

    #[tokio::test]
    async fn test_save_overwrites_both_tokens() {
        let store = MemoryTokenStore::with_credentials(Credentials::new("T1", "R1"));
        store.save(&Credentials::new("T2", "R2")).await.unwrap();
        assert_eq!(
            store.load().await.unwrap(),
            Some(Credentials::new("T2", "R2"))
        );
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemoryTokenStore::new();
        let other = store.clone();
        store.save(&Credentials::new("T1", "R1")).await.unwrap();
        other.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
    }
}
