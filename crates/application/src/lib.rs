//! Practicum Application - Authenticated API client
//!
//! This crate holds the client the SPA uses to talk to the practicum
//! backend, together with the ports its adapters implement.

pub mod auth;
pub mod client;
pub mod error;
pub mod ports;

pub use auth::{LogoutReason, MemoryTokenStore, RefreshCoordinator, SessionState};
pub use client::{AuthenticatedHttpClient, LOGIN_PATH, REFRESH_PATH};
pub use error::{ApiError, ApiResult, AuthFailure};
pub use ports::{
    HttpTransport, OutboundRequest, TokenStore, TokenStoreError, TransportError,
    TransportResponse,
};
