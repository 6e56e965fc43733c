//! Application routes
//!
//! The route table served by the binary: an index page, a static mount, and
//! a handful of JSON endpoints.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

use super::static_files::ServeDir;
use crate::config::{Config, MessageStyle};
use crate::error::{HandlerError, HandlerResult};
use crate::logger;
use crate::middleware::{boxed, send_file, send_json, Next, RequestContext};
use crate::routing::{Params, Router};

const INDEX_VIEW: &str = "index.html";
const HELLO: &str = "Hello json";
const TIME_KEY: &str = "time";

#[derive(Serialize)]
struct Message {
    message: String,
}

#[derive(Serialize)]
struct Echo<'a> {
    echo: &'a str,
}

#[derive(Serialize)]
struct Name {
    name: String,
}

#[derive(Serialize)]
struct Time<'a> {
    time: &'a Value,
}

/// Build the application's route table
pub fn build_router(config: &Config) -> Router {
    let mut router = Router::new();

    if config.logging.request_log {
        router.use_middleware(request_logger);
    }

    let index_page = Path::new(&config.app.views_dir).join(INDEX_VIEW);
    router
        .get(
            "/",
            [boxed(move |ctx: &mut RequestContext, _: &mut Next| -> HandlerResult {
                send_file(ctx, index_page.clone());
                Ok(())
            })],
        )
        .mount(
            &config.app.public_mount,
            ServeDir::new(&config.app.public_mount, &config.app.public_dir),
        )
        .get("/json", [boxed(json_message)])
        .get("/now", [boxed(stamp_time), boxed(send_time)])
        .get("/:word/echo", [boxed(echo_word)])
        .get("/name", [boxed(name_from_query)])
        .post("/name", [boxed(name_from_form)]);

    router
}

/// Root-level logger: `METHOD /path - ip`
fn request_logger(ctx: &mut RequestContext, next: &mut Next) -> HandlerResult {
    logger::log_request_line(ctx.method.as_str(), &ctx.path, ctx.remote_addr.as_ref());
    next.advance();
    Ok(())
}

/// `MESSAGE_STYLE` is read from the request's config snapshot every time
fn json_message(ctx: &mut RequestContext, _next: &mut Next) -> HandlerResult {
    let message = match ctx.app_config.message_style() {
        MessageStyle::Uppercase => HELLO.to_uppercase(),
        MessageStyle::Plain => HELLO.to_string(),
    };
    send_json(ctx, &Message { message })
}

fn stamp_time(ctx: &mut RequestContext, next: &mut Next) -> HandlerResult {
    ctx.custom
        .insert(TIME_KEY.to_string(), Value::String(Utc::now().to_rfc3339()));
    next.advance();
    Ok(())
}

fn send_time(ctx: &mut RequestContext, _next: &mut Next) -> HandlerResult {
    let time = ctx
        .custom
        .get(TIME_KEY)
        .cloned()
        .ok_or_else(|| HandlerError::Failed("request time was not stamped".to_string()))?;
    send_json(ctx, &Time { time: &time })
}

fn echo_word(ctx: &mut RequestContext, _next: &mut Next) -> HandlerResult {
    let word = ctx.params.get("word").cloned().unwrap_or_default();
    send_json(ctx, &Echo { echo: &word })
}

/// `first` and `last` joined by a space; a missing field counts as empty
fn full_name(fields: &Params) -> String {
    let first = fields.get("first").map_or("", String::as_str);
    let last = fields.get("last").map_or("", String::as_str);
    format!("{first} {last}")
}

fn name_from_query(ctx: &mut RequestContext, _next: &mut Next) -> HandlerResult {
    let name = full_name(&ctx.query);
    send_json(ctx, &Name { name })
}

fn name_from_form(ctx: &mut RequestContext, _next: &mut Next) -> HandlerResult {
    let name = full_name(&ctx.body);
    send_json(ctx, &Name { name })
}
