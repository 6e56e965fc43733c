//! Middleware chain executor
//!
//! Runs an ordered handler list over one request context. Every handler must
//! either write a response or call [`Next::advance`]; the chain moves through
//! `Pending -> Running(i) -> Done(outcome)` and never waits on a handler that
//! did neither.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use super::context::{Reply, RequestContext};
use crate::error::{HandlerError, HandlerResult};
use crate::logger;

/// One unit of a middleware chain
pub trait Handler: Send + Sync + 'static {
    fn call(&self, ctx: &mut RequestContext, next: &mut Next) -> HandlerResult;
}

impl<F> Handler for F
where
    F: Fn(&mut RequestContext, &mut Next) -> HandlerResult + Send + Sync + 'static,
{
    fn call(&self, ctx: &mut RequestContext, next: &mut Next) -> HandlerResult {
        self(ctx, next)
    }
}

pub type BoxedHandler = Box<dyn Handler>;

pub fn boxed(handler: impl Handler) -> BoxedHandler {
    Box::new(handler)
}

/// Continuation handed to each handler
#[derive(Debug, Default)]
pub struct Next {
    advanced: bool,
}

impl Next {
    /// Ask the executor to run the next handler
    pub fn advance(&mut self) {
        self.advanced = true;
    }

    pub const fn advanced(&self) -> bool {
        self.advanced
    }
}

/// Terminal result of running a chain
#[derive(Debug)]
pub enum Outcome {
    /// A handler wrote a response
    Completed(Reply),
    /// Every handler advanced and none responded
    Exhausted,
    Failed(HandlerError),
}

#[derive(Debug)]
enum ChainState {
    Pending,
    Running(usize),
    Done(Outcome),
}

/// Run `handlers` in order against `ctx`
pub fn run(handlers: &[&dyn Handler], ctx: &mut RequestContext) -> Outcome {
    let mut state = ChainState::Pending;
    loop {
        state = match state {
            ChainState::Pending => ChainState::Running(0),
            ChainState::Running(index) => match handlers.get(index) {
                Some(handler) => invoke(index, *handler, ctx),
                None => ChainState::Done(Outcome::Exhausted),
            },
            ChainState::Done(outcome) => return outcome,
        };
    }
}

fn invoke(index: usize, handler: &dyn Handler, ctx: &mut RequestContext) -> ChainState {
    let mut next = Next::default();
    let result = panic::catch_unwind(AssertUnwindSafe(|| handler.call(ctx, &mut next)));

    let outcome = match result {
        Err(payload) => Outcome::Failed(HandlerError::Panicked {
            index,
            message: panic_message(payload.as_ref()),
        }),
        Ok(Err(err)) => Outcome::Failed(err),
        Ok(Ok(())) => match ctx.take_reply() {
            Some(reply) => {
                if next.advanced() {
                    logger::log_warning(&format!(
                        "Handler #{index} for {} {} responded and advanced; response is final",
                        ctx.method, ctx.path
                    ));
                }
                Outcome::Completed(reply)
            }
            None if next.advanced() => return ChainState::Running(index + 1),
            None => Outcome::Failed(HandlerError::Stalled { index }),
        },
    };
    ChainState::Done(outcome)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::middleware::respond::send_json;
    use hyper::Method;
    use serde_json::json;
    use std::sync::Arc;

    fn ctx() -> RequestContext {
        RequestContext::new(Method::GET, "/test", None, Arc::new(AppConfig::default()))
    }

    /// Appends its tag to `custom["trace"]` and advances
    fn tracer(tag: &'static str) -> BoxedHandler {
        Box::new(move |ctx: &mut RequestContext, next: &mut Next| -> HandlerResult {
            let trace = ctx.custom.entry("trace".to_string()).or_insert(json!([]));
            if let Some(items) = trace.as_array_mut() {
                items.push(json!(tag));
            }
            next.advance();
            Ok(())
        })
    }

    fn responder(ctx: &mut RequestContext, _next: &mut Next) -> HandlerResult {
        let trace = ctx.custom.get("trace").cloned().unwrap_or(json!([]));
        send_json(ctx, &json!({ "trace": trace }))
    }

    fn trace_of(outcome: Outcome) -> serde_json::Value {
        match outcome {
            Outcome::Completed(Reply::Json(body)) => {
                serde_json::from_str::<serde_json::Value>(&body).unwrap()["trace"].clone()
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_runs_in_registration_order() {
        let a = tracer("a");
        let b = tracer("b");
        let c = tracer("c");
        let handlers: Vec<&dyn Handler> = vec![a.as_ref(), b.as_ref(), c.as_ref(), &responder];
        let outcome = run(&handlers, &mut ctx());
        assert_eq!(trace_of(outcome), json!(["a", "b", "c"]));
    }

    #[test]
    fn test_response_stops_chain() {
        let after = tracer("after");
        let handlers: Vec<&dyn Handler> = vec![&responder, after.as_ref()];
        let mut ctx = ctx();
        let outcome = run(&handlers, &mut ctx);
        assert_eq!(trace_of(outcome), json!([]));
        assert!(!ctx.custom.contains_key("trace"));
    }

    #[test]
    fn test_exhausted_when_nobody_responds() {
        let a = tracer("a");
        let b = tracer("b");
        let handlers: Vec<&dyn Handler> = vec![a.as_ref(), b.as_ref()];
        let mut ctx = ctx();
        assert!(matches!(run(&handlers, &mut ctx), Outcome::Exhausted));
        assert_eq!(ctx.custom["trace"], json!(["a", "b"]));
    }

    #[test]
    fn test_empty_chain_is_exhausted() {
        assert!(matches!(run(&[], &mut ctx()), Outcome::Exhausted));
    }

    #[test]
    fn test_stalled_handler_fails() {
        let stall = |_: &mut RequestContext, _: &mut Next| -> HandlerResult { Ok(()) };
        let after = tracer("after");
        let handlers: Vec<&dyn Handler> = vec![&stall, after.as_ref()];
        let mut ctx = ctx();
        let outcome = run(&handlers, &mut ctx);
        assert!(matches!(
            outcome,
            Outcome::Failed(HandlerError::Stalled { index: 0 })
        ));
        assert!(ctx.custom.is_empty());
    }

    #[test]
    fn test_error_fails_chain() {
        let a = tracer("a");
        let fail = |_: &mut RequestContext, _: &mut Next| -> HandlerResult {
            Err(HandlerError::Failed("database unavailable".to_string()))
        };
        let handlers: Vec<&dyn Handler> = vec![a.as_ref(), &fail, &responder];
        match run(&handlers, &mut ctx()) {
            Outcome::Failed(HandlerError::Failed(msg)) => assert_eq!(msg, "database unavailable"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_panic_is_captured() {
        let boom = |_: &mut RequestContext, _: &mut Next| -> HandlerResult {
            panic!("boom");
        };
        let handlers: Vec<&dyn Handler> = vec![&boom];
        match run(&handlers, &mut ctx()) {
            Outcome::Failed(HandlerError::Panicked { index, message }) => {
                assert_eq!(index, 0);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_respond_and_advance_first_writer_wins() {
        let both = |ctx: &mut RequestContext, next: &mut Next| -> HandlerResult {
            send_json(ctx, &json!({ "from": "both" }))?;
            next.advance();
            Ok(())
        };
        let after = tracer("after");
        let handlers: Vec<&dyn Handler> = vec![&both, after.as_ref(), &responder];
        let mut ctx = ctx();
        match run(&handlers, &mut ctx) {
            Outcome::Completed(Reply::Json(body)) => assert_eq!(body, r#"{"from":"both"}"#),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(ctx.custom.is_empty());
    }

    #[test]
    fn test_handler_sees_previous_mutation() {
        let stamp = |ctx: &mut RequestContext, next: &mut Next| -> HandlerResult {
            ctx.custom.insert("stage".to_string(), json!(1));
            next.advance();
            Ok(())
        };
        let check = |ctx: &mut RequestContext, _: &mut Next| -> HandlerResult {
            let stage = ctx.custom.get("stage").cloned();
            send_json(ctx, &json!({ "stage": stage }))
        };
        let handlers: Vec<&dyn Handler> = vec![&stamp, &check];
        match run(&handlers, &mut ctx()) {
            Outcome::Completed(Reply::Json(body)) => assert_eq!(body, r#"{"stage":1}"#),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
