//! Middleware pipeline
//!
//! Request context, the chain executor and the response formatter handlers
//! use to finish a chain.

pub mod chain;
pub mod context;
pub mod respond;

pub use chain::{boxed, BoxedHandler, Handler, Next, Outcome};
pub use context::{Reply, RequestContext};
pub use respond::{send_file, send_json};
