//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger() → every subscribed server stops accepting → in-flight
//!     submissions finish → run() returns
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger()
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
