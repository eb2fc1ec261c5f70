//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the client core and the outside
//! world: the network and the place tokens are persisted.

mod token_store;
mod transport;

pub use token_store::{TokenStore, TokenStoreError};
pub use transport::{HttpTransport, OutboundRequest, TransportError, TransportResponse};
