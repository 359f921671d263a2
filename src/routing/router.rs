//! Route table and request resolution.
//!
//! # Responsibilities
//! - Store routes per method: literal paths in a map, patterns in order
//! - Normalize the request path (base path, empty path, trailing slash)
//! - Dispatch to exactly one handler or fall back to 404
//! - Treat HEAD as GET and discard the body afterwards
//!
//! # Design Decisions
//! - Built once at startup, immutable afterwards (shared via Arc, no locks)
//! - Literal routes are checked before any pattern
//! - Patterns are tried in registration order, first match wins
//! - Re-registering a (method, pattern) replaces the old entry in place

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::Method;
use thiserror::Error;

use crate::http::context::RequestContext;
use crate::routing::middleware::{run_chain, Flow, Middleware, MiddlewareList};
use crate::routing::pattern::{is_dynamic, PathParams, PathPattern, PatternError};

/// Error raised by a handler. Passed through `resolve` untouched.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// A request handler.
///
/// Exact routes receive an empty parameter map.
pub trait Handler: Send + Sync {
    fn call(&self, ctx: &mut RequestContext, params: &PathParams) -> Result<(), HandlerError>;
}

impl<F> Handler for F
where
    F: Fn(&mut RequestContext, &PathParams) -> Result<(), HandlerError> + Send + Sync,
{
    fn call(&self, ctx: &mut RequestContext, params: &PathParams) -> Result<(), HandlerError> {
        self(ctx, params)
    }
}

/// Failure to resolve a request.
#[derive(Debug, Error)]
pub enum RouteError {
    /// A registered pattern has a broken regex fragment.
    #[error("routing configuration error: {0}")]
    Pattern(#[from] PatternError),

    /// The matched handler failed.
    #[error("handler failed: {0}")]
    Handler(#[source] HandlerError),
}

/// How a request was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Matched a literal route and ran its handler.
    Exact,
    /// Matched a pattern route and ran its handler.
    Pattern,
    /// A middleware halted before the handler.
    Halted,
    /// Nothing matched; 404 emitted.
    NotFound,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Exact => "exact",
            Resolution::Pattern => "pattern",
            Resolution::Halted => "halted",
            Resolution::NotFound => "not_found",
        }
    }
}

struct Route {
    handler: Arc<dyn Handler>,
    middleware: MiddlewareList,
}

impl Route {
    fn invoke(&self, ctx: &mut RequestContext, params: &PathParams) -> Result<Flow, RouteError> {
        if run_chain(&self.middleware, ctx) == Flow::Halt {
            return Ok(Flow::Halt);
        }
        self.handler.call(ctx, params).map_err(RouteError::Handler)?;
        Ok(Flow::Continue)
    }
}

struct PatternRoute {
    pattern: PathPattern,
    route: Route,
}

/// Method + path route table.
#[derive(Default)]
pub struct Router {
    base_path: String,
    exact: HashMap<Method, HashMap<String, Route>>,
    patterns: HashMap<Method, Vec<PatternRoute>>,
}

impl Router {
    /// Create an empty router mounted at the site root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty router that strips `base_path` from incoming paths.
    pub fn with_base_path(base_path: &str) -> Self {
        Self {
            base_path: base_path.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Register a route. A previous route for the same method and pattern
    /// is replaced.
    pub fn register<H>(&mut self, method: Method, pattern: &str, handler: H, middleware: MiddlewareList)
    where
        H: Handler + 'static,
    {
        let route = Route {
            handler: Arc::new(handler),
            middleware,
        };

        if is_dynamic(pattern) {
            let routes = self.patterns.entry(method).or_default();
            match routes.iter_mut().find(|r| r.pattern.as_str() == pattern) {
                Some(existing) => existing.route = route,
                None => routes.push(PatternRoute {
                    pattern: PathPattern::new(pattern),
                    route,
                }),
            }
        } else {
            self.exact
                .entry(method)
                .or_default()
                .insert(pattern.to_string(), route);
        }
    }

    pub fn get<H: Handler + 'static>(&mut self, pattern: &str, handler: H, middleware: MiddlewareList) {
        self.register(Method::GET, pattern, handler, middleware);
    }

    pub fn post<H: Handler + 'static>(&mut self, pattern: &str, handler: H, middleware: MiddlewareList) {
        self.register(Method::POST, pattern, handler, middleware);
    }

    pub fn put<H: Handler + 'static>(&mut self, pattern: &str, handler: H, middleware: MiddlewareList) {
        self.register(Method::PUT, pattern, handler, middleware);
    }

    pub fn delete<H: Handler + 'static>(&mut self, pattern: &str, handler: H, middleware: MiddlewareList) {
        self.register(Method::DELETE, pattern, handler, middleware);
    }

    /// Number of registered routes across all methods.
    pub fn len(&self) -> usize {
        self.exact.values().map(HashMap::len).sum::<usize>()
            + self.patterns.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Compile every pattern now and report the broken ones.
    ///
    /// Resolution does this lazily anyway; calling it at startup turns a
    /// bad fragment into a boot failure instead of a 500 on first hit.
    pub fn check_patterns(&self) -> Vec<PatternError> {
        self.patterns
            .values()
            .flatten()
            .filter_map(|r| r.pattern.check().err())
            .collect()
    }

    /// Apply base path stripping and slash normalization.
    pub fn normalize_path(&self, raw: &str) -> String {
        let mut path = raw;

        if !self.base_path.is_empty() {
            if let Some(rest) = path.strip_prefix(self.base_path.as_str()) {
                if rest.is_empty() || rest.starts_with('/') {
                    path = rest;
                }
            }
        }

        if path.is_empty() {
            return "/".to_string();
        }
        if path.len() > 1 {
            if let Some(stripped) = path.strip_suffix('/') {
                path = stripped;
            }
        }
        path.to_string()
    }

    /// Resolve the request in `ctx` and run the matched route.
    pub fn resolve(&self, ctx: &mut RequestContext) -> Result<Resolution, RouteError> {
        let is_head = *ctx.method() == Method::HEAD;
        let method = if is_head { Method::GET } else { ctx.method().clone() };
        let path = self.normalize_path(ctx.path());

        let resolution = self.dispatch(&method, &path, ctx)?;

        if is_head {
            ctx.reply_mut().clear_body();
        }

        tracing::debug!(
            request_id = %ctx.request_id(),
            method = %ctx.method(),
            path = %path,
            outcome = resolution.as_str(),
            "Route resolved"
        );
        Ok(resolution)
    }

    fn dispatch(&self, method: &Method, path: &str, ctx: &mut RequestContext) -> Result<Resolution, RouteError> {
        if let Some(route) = self.exact.get(method).and_then(|routes| routes.get(path)) {
            return Ok(match route.invoke(ctx, &PathParams::new())? {
                Flow::Continue => Resolution::Exact,
                Flow::Halt => Resolution::Halted,
            });
        }

        for candidate in self.patterns.get(method).into_iter().flatten() {
            if let Some(params) = candidate.pattern.captures(path)? {
                return Ok(match candidate.route.invoke(ctx, &params)? {
                    Flow::Continue => Resolution::Pattern,
                    Flow::Halt => Resolution::Halted,
                });
            }
        }

        ctx.not_found();
        Ok(Resolution::NotFound)
    }
}

/// Shorthand for building a middleware list.
pub fn middleware<M: Middleware + 'static>(m: M) -> MiddlewareList {
    vec![Arc::new(m)]
}
