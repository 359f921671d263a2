//! Process lifecycle.
//!
//! # Data Flow
//! ```text
//! SIGINT / SIGTERM
//!     → signals.rs (wait for the first signal)
//!     → shutdown.rs (broadcast to every subscriber)
//!     → HttpServer::run (stop accepting, drain in-flight requests)
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
