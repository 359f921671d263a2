//! Customer authentication.
//!
//! # Responsibilities
//! - Hash and verify passwords (password.rs)
//! - Gate protected routes on the session's login state (middleware.rs)

pub mod middleware;
pub mod password;

pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
