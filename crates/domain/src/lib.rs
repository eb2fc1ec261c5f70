//! Practicum Domain - Core client types
//!
//! This crate defines the domain model for the Practicum API client:
//! credentials, the auth service wire messages, request and response
//! descriptors, and client settings.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod error;
pub mod request;
pub mod response;
pub mod settings;

pub use auth::{
    Credentials, LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, User,
};
pub use error::{DomainError, DomainResult};
pub use request::{ApiRequest, HttpMethod, RequestOptions};
pub use response::ApiResponse;
pub use settings::ClientSettings;
