//! Port adapters.

mod reqwest_transport;

pub use reqwest_transport::{ReqwestTransport, USER_AGENT};
