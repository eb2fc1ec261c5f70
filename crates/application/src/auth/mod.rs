//! Session and token refresh handling.
//!
//! This module provides:
//! - The single-flight refresh coordinator and its request queue
//! - Observable session state
//! - An in-memory token store

mod coordinator;
mod session;
mod token_store;

pub use coordinator::{Admission, DrainedQueue, PendingReceiver, PendingRequest, RefreshCoordinator};
pub use session::{LogoutReason, SessionState};
pub use token_store::MemoryTokenStore;
