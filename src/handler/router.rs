//! Request boundary
//!
//! Entry point for HTTP request processing: builds the request context, runs
//! the route chain and turns its outcome (or failure) into a response. Nothing
//! escapes this function as an error.

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderMap, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, SERVER};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use super::static_files;
use crate::config::AppState;
use crate::error::ServeError;
use crate::http::{self, EntityTag};
use crate::logger::{self, AccessLogEntry};
use crate::middleware::{Outcome, Reply, RequestContext};
use crate::routing::{parse_form, Params};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: Option<SocketAddr>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let started = Instant::now();
    let (parts, body) = req.into_parts();
    let is_head = parts.method == Method::HEAD;

    let mut ctx = RequestContext::new(
        parts.method.clone(),
        parts.uri.path(),
        parts.uri.query(),
        Arc::clone(&state.app_config),
    );
    if let Some(addr) = remote_addr {
        ctx = ctx.with_remote_addr(addr);
    }

    let mut response = match read_form_body(&parts, body, state.config.http.max_body_size).await {
        Ok(fields) => {
            ctx.body = fields;
            run_chain(&state, &mut ctx, &parts.headers, is_head).await
        }
        Err(err) => error_response(&err),
    };

    if let Ok(server) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, server);
    }

    if state.config.logging.access_log {
        log_access(&state, &parts, remote_addr, &response, started);
    }
    Ok(response)
}

/// Decode an urlencoded body; other bodies are left unread
async fn read_form_body<B>(parts: &Parts, body: B, max_body_size: u64) -> Result<Params, ServeError>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let is_form = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(is_form_content_type);
    if !is_form {
        return Ok(Params::new());
    }

    let declared = parts
        .headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if declared.is_some_and(|size| size > max_body_size) {
        return Err(ServeError::PayloadTooLarge {
            limit: max_body_size,
        });
    }

    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(parse_form(&collected.to_bytes())),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(ServeError::PayloadTooLarge {
                limit: max_body_size,
            })
        }
        Err(e) => Err(ServeError::BadBody(e.to_string())),
    }
}

/// Media type names are case-insensitive; parameters after `;` are ignored
fn is_form_content_type(value: &str) -> bool {
    value
        .split(';')
        .next()
        .is_some_and(|media| media.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}

async fn run_chain(
    state: &AppState,
    ctx: &mut RequestContext,
    headers: &HeaderMap,
    is_head: bool,
) -> Response<Full<Bytes>> {
    match state.router.dispatch(ctx) {
        Outcome::Completed(Reply::Json(body)) => http::build_json_response(body, is_head),
        Outcome::Completed(Reply::File(path)) => {
            let if_none_match = headers.get("if-none-match").and_then(|v| v.to_str().ok());
            serve_file_reply(&path, if_none_match, is_head).await
        }
        Outcome::Exhausted => error_response(&ServeError::RouteNotFound {
            method: ctx.method.clone(),
            path: ctx.path.clone(),
        }),
        Outcome::Failed(err) => error_response(&ServeError::HandlerFault(err)),
    }
}

async fn serve_file_reply(
    path: &Path,
    if_none_match: Option<&str>,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let Some((content, content_type)) = static_files::load_file(path).await else {
        return error_response(&ServeError::MissingAsset(path.to_path_buf()));
    };

    let etag = EntityTag::for_content(&content);
    if etag.matches(if_none_match) {
        return http::build_304_response(&etag);
    }
    http::build_file_response(content, content_type, &etag, is_head)
}

fn error_response(err: &ServeError) -> Response<Full<Bytes>> {
    match err {
        ServeError::HandlerFault(_) => logger::log_error(&err.to_string()),
        ServeError::PayloadTooLarge { .. } | ServeError::BadBody(_) => {
            logger::log_warning(&err.to_string());
        }
        ServeError::RouteNotFound { .. } | ServeError::MissingAsset(_) => {
            logger::log_debug(&err.to_string());
        }
    }
    http::build_error_response(err.status())
}

fn log_access(
    state: &AppState,
    parts: &Parts,
    remote_addr: Option<SocketAddr>,
    response: &Response<Full<Bytes>>,
    started: Instant,
) {
    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };

    let mut entry = AccessLogEntry::new(
        remote_addr.map_or_else(|| "-".to_string(), |a| a.ip().to_string()),
        parts.method.to_string(),
        parts.uri.path().to_string(),
    );
    entry.query = parts.uri.query().map(String::from);
    entry.http_version = format!("{:?}", parts.version)
        .trim_start_matches("HTTP/")
        .to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);
    entry.referer = header("referer");
    entry.user_agent = header("user-agent");
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

    logger::log_access(&entry, &state.config.logging.access_log_format);
}
