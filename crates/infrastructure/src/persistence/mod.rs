//! File-based persistence.

mod file_token_store;
mod settings_repository;

pub use file_token_store::FileTokenStore;
pub use settings_repository::{API_URL_ENV, SettingsError, SettingsRepository, apply_env_override};
