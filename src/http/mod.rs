//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware layers, body + session decoding)
//!     → context.rs (RequestContext handed to the route table)
//!     → routing (middleware chain, handler)
//!     → server.rs (session write-back, response assembly)
//!     → Send to client
//! ```

pub mod context;
pub mod server;

pub use context::{Reply, RequestContext};
pub use server::HttpServer;
