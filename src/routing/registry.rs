//! Route registry
//!
//! Built once at startup and read-only afterwards. Routes and mounts live in
//! one list and are resolved in registration order, so when two entries both
//! match a request the one registered first wins. An entry whose handlers all
//! advance hands the request on to the next matching entry.

use hyper::Method;

use super::matcher::{Pattern, Prefix};
use super::Params;
use crate::error::HandlerResult;
use crate::logger;
use crate::middleware::{chain, BoxedHandler, Handler, Next, Outcome, RequestContext};

enum Target {
    /// A method + pattern
    Route { method: Method, pattern: Pattern },
    /// A path prefix, for any method
    Mount(Prefix),
}

/// One registered entry with its ordered handler list
struct Layer {
    target: Target,
    handlers: Vec<BoxedHandler>,
}

impl Layer {
    /// `GET` routes also answer `HEAD`
    fn match_request(&self, method: &Method, path: &str) -> Option<Params> {
        match &self.target {
            Target::Route {
                method: route_method,
                pattern,
            } => {
                let method_ok = route_method == method
                    || (*method == Method::HEAD && *route_method == Method::GET);
                if method_ok {
                    pattern.match_path(path)
                } else {
                    None
                }
            }
            Target::Mount(prefix) => prefix.strip(path).map(|_| Params::new()),
        }
    }

    fn describe(&self) -> &str {
        match &self.target {
            Target::Route { pattern, .. } => pattern.as_str(),
            Target::Mount(prefix) => prefix.as_str(),
        }
    }
}

/// Binds a layer's params before its handlers run
struct BindParams(Params);

impl Handler for BindParams {
    fn call(&self, ctx: &mut RequestContext, next: &mut Next) -> HandlerResult {
        ctx.params.clone_from(&self.0);
        next.advance();
        Ok(())
    }
}

/// Result of looking up a request
pub enum Resolution<'r> {
    Matched {
        handlers: &'r [BoxedHandler],
        params: Params,
    },
    NotFound,
}

#[derive(Default)]
pub struct Router {
    middleware: Vec<BoxedHandler>,
    layers: Vec<Layer>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add application middleware, run before every matched entry
    pub fn use_middleware(&mut self, handler: impl Handler) -> &mut Self {
        self.middleware.push(Box::new(handler));
        self
    }

    pub fn route<I>(&mut self, method: Method, pattern: &str, handlers: I) -> &mut Self
    where
        I: IntoIterator<Item = BoxedHandler>,
    {
        self.layers.push(Layer {
            target: Target::Route {
                method,
                pattern: Pattern::compile(pattern),
            },
            handlers: handlers.into_iter().collect(),
        });
        self
    }

    pub fn get<I>(&mut self, pattern: &str, handlers: I) -> &mut Self
    where
        I: IntoIterator<Item = BoxedHandler>,
    {
        self.route(Method::GET, pattern, handlers)
    }

    pub fn post<I>(&mut self, pattern: &str, handlers: I) -> &mut Self
    where
        I: IntoIterator<Item = BoxedHandler>,
    {
        self.route(Method::POST, pattern, handlers)
    }

    /// Hand every path under `prefix` to `handler`, for any method
    ///
    /// The mount takes its place in registration order alongside routes.
    pub fn mount(&mut self, prefix: &str, handler: impl Handler) -> &mut Self {
        self.layers.push(Layer {
            target: Target::Mount(Prefix::compile(prefix)),
            handlers: vec![Box::new(handler)],
        });
        self
    }

    /// Every entry matching the request, in registration order
    fn matching<'r, 'q>(
        &'r self,
        method: &'q Method,
        path: &'q str,
    ) -> impl Iterator<Item = (&'r Layer, Params)> + 'q
    where
        'r: 'q,
    {
        self.layers
            .iter()
            .filter_map(move |layer| layer.match_request(method, path).map(|p| (layer, p)))
    }

    /// Find the first registered entry for `method` and `path`
    pub fn resolve(&self, method: &Method, path: &str) -> Resolution<'_> {
        match self.matching(method, path).next() {
            Some((layer, params)) => Resolution::Matched {
                handlers: &layer.handlers,
                params,
            },
            None => Resolution::NotFound,
        }
    }

    /// Run middleware, then every matching entry in order, as one chain
    ///
    /// Each entry's params are bound just before its handlers run. Unmatched
    /// requests still pass through the application middleware and end as
    /// `Outcome::Exhausted` unless a middleware responds.
    pub fn dispatch(&self, ctx: &mut RequestContext) -> Outcome {
        let method = ctx.method.clone();
        let path = ctx.path.clone();

        let matched: Vec<(BindParams, &[BoxedHandler])> = self
            .matching(&method, &path)
            .map(|(layer, params)| {
                logger::log_debug(&format!(
                    "Route matched: {method} {path} -> {}",
                    layer.describe()
                ));
                (BindParams(params), layer.handlers.as_slice())
            })
            .collect();
        if matched.is_empty() {
            logger::log_debug(&format!("No route matched: {method} {path}"));
        }

        let mut handlers: Vec<&dyn Handler> =
            self.middleware.iter().map(|h| h.as_ref() as &dyn Handler).collect();
        for (bind, layer_handlers) in &matched {
            handlers.push(bind);
            handlers.extend(layer_handlers.iter().map(|h| h.as_ref() as &dyn Handler));
        }
        chain::run(&handlers, ctx)
    }
}
