//! Request handler module
//!
//! The application's routes, the static file mount and the request boundary
//! that turns a chain outcome into an HTTP response.

pub mod app;
pub mod router;
pub mod static_files;

pub use router::handle_request;
