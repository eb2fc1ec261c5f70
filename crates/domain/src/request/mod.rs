//! Request descriptors

mod method;
mod options;
mod spec;

pub use method::HttpMethod;
pub use options::RequestOptions;
pub use spec::ApiRequest;
