//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! RequestContext (method, raw path)
//!     → router.rs (base path stripping, slash normalization)
//!     → exact table lookup for the method
//!     → pattern.rs (ordered pattern routes, named captures)
//!     → middleware.rs (route chain, may halt)
//!     → Handler::call(ctx, params)
//!     → Return: Resolution or RouteError
//! ```
//!
//! # Design Decisions
//! - Routes registered at startup, immutable at runtime
//! - Literal paths are a hash lookup; regex only for `{name:regex}` routes
//! - Deterministic: same input always matches same route
//! - First matching pattern wins (registration order)

pub mod middleware;
pub mod pattern;
pub mod router;

pub use middleware::{Flow, Middleware, MiddlewareList};
pub use pattern::{PathParams, PathPattern, PatternError};
pub use router::{middleware, Handler, HandlerError, Resolution, RouteError, Router};
