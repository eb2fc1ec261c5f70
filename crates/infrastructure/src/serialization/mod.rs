//! JSON serialization for the files the client persists.

mod json;

pub use json::*;
