//! Practicum Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer.

pub mod adapters;
pub mod persistence;
pub mod serialization;

pub use adapters::ReqwestTransport;
pub use persistence::{
    API_URL_ENV, FileTokenStore, SettingsError, SettingsRepository, apply_env_override,
};
pub use serialization::{SerializationError, from_json_bytes, to_json_pretty_bytes};
