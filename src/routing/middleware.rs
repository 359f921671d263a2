//! Pre-handler gates.
//!
//! A middleware inspects the context and either lets the chain continue or
//! halts it, typically after setting a redirect. It cannot rewrite the path
//! parameters.

use std::sync::Arc;

use crate::http::context::RequestContext;

/// Decision returned by a middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Halt,
}

/// A gate run before a route's handler.
pub trait Middleware: Send + Sync {
    fn handle(&self, ctx: &mut RequestContext) -> Flow;
}

impl<F> Middleware for F
where
    F: Fn(&mut RequestContext) -> Flow + Send + Sync,
{
    fn handle(&self, ctx: &mut RequestContext) -> Flow {
        self(ctx)
    }
}

/// Ordered middleware attached to a route.
pub type MiddlewareList = Vec<Arc<dyn Middleware>>;

/// Run `chain` in order, stopping at the first halt.
pub fn run_chain(chain: &[Arc<dyn Middleware>], ctx: &mut RequestContext) -> Flow {
    for middleware in chain {
        if middleware.handle(ctx) == Flow::Halt {
            return Flow::Halt;
        }
    }
    Flow::Continue
}
