//! HTTP response building module
//!
//! Builders for the responses the request boundary can emit.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

use super::cache::EntityTag;
use super::mime;

/// Build 200 JSON response from already serialized text
pub fn build_json_response(body: String, is_head: bool) -> Response<Full<Bytes>> {
    let content_length = body.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(body)
    };

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", mime::JSON)
        .header("Content-Length", content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("JSON", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 200 file response with `ETag` validator
pub fn build_file_response(
    data: Vec<u8>,
    content_type: &str,
    etag: &EntityTag,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(data)
    };

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .header("ETag", etag.as_str())
        .header("Cache-Control", "public, max-age=0")
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("file", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 304 Not Modified response
pub fn build_304_response(etag: &EntityTag) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header("ETag", etag.as_str())
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build plain-text error response such as `404 Not Found`
pub fn build_error_response(status: StatusCode) -> Response<Full<Bytes>> {
    let text = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error")
    );

    Response::builder()
        .status(status)
        .header("Content-Type", mime::TEXT)
        .header("Content-Length", text.len())
        .body(Full::new(Bytes::from(text)))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Log response build error
fn log_build_error(kind: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {kind} response: {error}"));
}
