//! Login gate for customer-only pages.

use crate::http::context::RequestContext;
use crate::routing::middleware::{Flow, Middleware};

/// Redirects anonymous visitors to the login page.
///
/// The requested path is remembered so a successful login can return there.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthMiddleware;

impl Middleware for AuthMiddleware {
    fn handle(&self, ctx: &mut RequestContext) -> Flow {
        if ctx.session.is_authenticated() {
            return Flow::Continue;
        }

        tracing::debug!(request_id = %ctx.request_id(), path = %ctx.path(), "Anonymous request to protected page");
        ctx.session.redirect_after_login = Some(ctx.path().to_string());
        let login = ctx.url("/login");
        ctx.redirect(&login);
        Flow::Halt
    }
}
