//! Per-request context shared by the handlers of one chain

use hyper::Method;
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::logger;
use crate::routing::{parse_query, Params};

/// Response recorded by a handler, rendered at the request boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Serialized JSON text
    Json(String),
    /// File to stream back, read asynchronously after the chain finishes
    File(PathBuf),
}

/// Mutable request state, owned by exactly one in-flight request
#[derive(Debug)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub raw_query: Option<String>,
    /// Named path segments bound by the matched route
    pub params: Params,
    pub query: Params,
    /// Fields of an `application/x-www-form-urlencoded` body
    pub body: Params,
    /// Free-form data handed from one handler to the next
    pub custom: HashMap<String, Value>,
    pub remote_addr: Option<SocketAddr>,
    /// Configuration snapshot taken when the request arrived
    pub app_config: Arc<AppConfig>,
    reply: Option<Reply>,
}

impl RequestContext {
    pub fn new(
        method: Method,
        path: impl Into<String>,
        raw_query: Option<&str>,
        app_config: Arc<AppConfig>,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            raw_query: raw_query.map(String::from),
            params: Params::new(),
            query: raw_query.map(parse_query).unwrap_or_default(),
            body: Params::new(),
            custom: HashMap::new(),
            remote_addr: None,
            app_config,
            reply: None,
        }
    }

    #[must_use]
    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Whether a handler has written the response
    pub const fn responded(&self) -> bool {
        self.reply.is_some()
    }

    /// Record the reply; a second write is ignored so the first writer wins
    pub(crate) fn set_reply(&mut self, reply: Reply) {
        if self.reply.is_some() {
            logger::log_warning(&format!(
                "Response already written for {} {}, ignoring {reply:?}",
                self.method, self.path
            ));
            return;
        }
        self.reply = Some(reply);
    }

    pub(crate) fn take_reply(&mut self) -> Option<Reply> {
        self.reply.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(query: Option<&str>) -> RequestContext {
        RequestContext::new(Method::GET, "/name", query, Arc::new(AppConfig::default()))
    }

    #[test]
    fn test_query_parsed_on_creation() {
        let ctx = ctx(Some("first=John&last=Doe"));
        assert_eq!(ctx.query.get("first").map(String::as_str), Some("John"));
        assert_eq!(ctx.raw_query.as_deref(), Some("first=John&last=Doe"));
        assert!(!ctx.responded());
    }

    #[test]
    fn test_first_reply_wins() {
        let mut ctx = ctx(None);
        ctx.set_reply(Reply::Json("{\"a\":1}".to_string()));
        ctx.set_reply(Reply::Json("{\"b\":2}".to_string()));
        assert!(ctx.responded());
        assert_eq!(ctx.take_reply(), Some(Reply::Json("{\"a\":1}".to_string())));
        assert!(!ctx.responded());
    }
}
