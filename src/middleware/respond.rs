//! Response formatter used by handlers
//!
//! Writing a reply marks the context as responded, which ends the chain once
//! the current handler returns.

use serde::Serialize;
use std::path::PathBuf;

use super::context::{Reply, RequestContext};
use crate::error::HandlerResult;

/// Serialize `value` as the JSON response body
pub fn send_json<T: Serialize + ?Sized>(ctx: &mut RequestContext, value: &T) -> HandlerResult {
    let body = serde_json::to_string(value)?;
    ctx.set_reply(Reply::Json(body));
    Ok(())
}

/// Respond with the contents of `path`
///
/// The file is read after the chain completes; a missing file becomes a 404.
pub fn send_file(ctx: &mut RequestContext, path: impl Into<PathBuf>) {
    ctx.set_reply(Reply::File(path.into()));
}
