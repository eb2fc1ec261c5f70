//! Token store port

use async_trait::async_trait;
use practicum_domain::Credentials;
use thiserror::Error;

/// Errors raised by token store implementations.
#[derive(Debug, Error)]
pub enum TokenStoreError {
    /// IO error while reading or writing persisted tokens.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted tokens could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Port for persisting the credential pair across restarts.
///
/// Both tokens are always written and cleared together.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Returns the stored credentials, if any.
    async fn load(&self) -> Result<Option<Credentials>, TokenStoreError>;

    /// Replaces both tokens atomically.
    async fn save(&self, credentials: &Credentials) -> Result<(), TokenStoreError>;

    /// Removes both tokens.
    async fn clear(&self) -> Result<(), TokenStoreError>;
}
