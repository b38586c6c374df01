//! Logging capability and subscriber setup for Sluice.
//!
//! Sluice components never talk to a concrete log sink. They receive an
//! [`Logger`] capability at construction time and emit leveled messages with
//! key/value fields through it:
//!
//! - [`TracingLogger`] forwards to the `tracing` macros (the default)
//! - [`MemoryLogger`] records entries in memory for assertions in tests
//! - [`NoopLogger`] discards everything
//!
//! Binaries that want `tracing` output installed globally call
//! [`init_logging`] once at startup.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use sluice_telemetry::{Logger, MemoryLogger};
//!
//! let logger = Arc::new(MemoryLogger::new());
//! logger.info("Starting HTTP server", &[("address", &"127.0.0.1:8080")]);
//!
//! assert_eq!(logger.count("Starting HTTP server"), 1);
//! ```

#![doc(html_root_url = "https://docs.rs/sluice-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logger;
pub mod logging;

pub use error::TelemetryError;
pub use logger::{Field, Level, LogRecord, Logger, MemoryLogger, NoopLogger, TracingLogger};
pub use logging::{init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
