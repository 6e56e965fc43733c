//! Error types
//!
//! `HandlerError` is what a chain handler can fail with; `ServeError` is the
//! taxonomy the request boundary turns into an HTTP status.

use hyper::{Method, StatusCode};
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single handler inside a middleware chain
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler returned without responding and without advancing
    #[error("handler #{index} neither responded nor advanced the chain")]
    Stalled { index: usize },

    #[error("handler #{index} panicked: {message}")]
    Panicked { index: usize, message: String },

    #[error("failed to serialize JSON response: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("{0}")]
    Failed(String),
}

pub type HandlerResult = Result<(), HandlerError>;

/// Failures surfaced at the chain boundary
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("no route for {method} {path}")]
    RouteNotFound { method: Method, path: String },

    #[error("handler fault: {0}")]
    HandlerFault(#[from] HandlerError),

    #[error("static file not found: {}", .0.display())]
    MissingAsset(PathBuf),

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: u64 },

    #[error("failed to read request body: {0}")]
    BadBody(String),
}

impl ServeError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::RouteNotFound { .. } | Self::MissingAsset(_) => StatusCode::NOT_FOUND,
            Self::HandlerFault(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::BadBody(_) => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let not_found = ServeError::RouteNotFound {
            method: Method::GET,
            path: "/nope".to_string(),
        };
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ServeError::MissingAsset(PathBuf::from("public/x.css")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServeError::from(HandlerError::Stalled { index: 1 }).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServeError::PayloadTooLarge { limit: 10 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn test_messages() {
        let err = HandlerError::Stalled { index: 2 };
        assert_eq!(
            err.to_string(),
            "handler #2 neither responded nor advanced the chain"
        );
        let not_found = ServeError::RouteNotFound {
            method: Method::POST,
            path: "/json".to_string(),
        };
        assert_eq!(not_found.to_string(), "no route for POST /json");
    }
}
