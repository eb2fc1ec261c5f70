//! Authentication domain types

mod credentials;
mod messages;

pub use credentials::Credentials;
pub use messages::{LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, User};
