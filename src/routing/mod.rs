//! Routing module
//!
//! Provides the request routing layer:
//! - Route patterns with named path segments
//! - Query string and form body decoding
//! - The route registry that resolves a request to its handler chain

mod matcher;
mod query;
mod registry;

use std::collections::HashMap;

/// Flat name to value mapping for path, query and form parameters
pub type Params = HashMap<String, String>;

pub use matcher::Prefix;
pub use query::{decode_or_raw, parse_form, parse_query};
pub use registry::Router;
