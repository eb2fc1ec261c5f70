//! Response types

mod spec;

pub use spec::{ApiResponse, parse_body};
