//! Shared helpers for the stove binaries
//!
//! - [`logging`]: tracing subscriber setup
//! - [`shutdown`]: Ctrl+C / SIGTERM handling

pub mod error;
pub mod logging;
pub mod shutdown;

pub use error::{Error, Result};
pub use logging::{init_logging, LogConfig, LogFormat};
pub use shutdown::{wait_for_shutdown, ShutdownSignal};
