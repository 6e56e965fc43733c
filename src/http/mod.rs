//! HTTP protocol layer module
//!
//! Content types, conditional requests and response builders, kept apart
//! from routing and handler logic.

pub mod cache;
pub mod mime;
pub mod response;

pub use cache::EntityTag;
pub use response::{
    build_304_response, build_error_response, build_file_response, build_json_response,
};
