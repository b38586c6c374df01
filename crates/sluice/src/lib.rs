//! # Sluice
//!
//! A lifecycle-managed HTTP server with composable middleware, plus the
//! configuration model for a bounded background worker pool.
//!
//! - [`server`]: start, serve and drain an HTTP listener with a one-shot
//!   shutdown
//! - [`middleware`]: handler and middleware function values and their
//!   composition
//! - [`worker`]: pool sizing bounds and resizing strategies
//! - [`telemetry`]: the logger capability and `tracing` setup
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sluice::prelude::*;
//! use http::StatusCode;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), TelemetryError> {
//!     init_logging(&LogConfig::development())?;
//!
//!     let server = Server::new(ServerConfig::default(), Arc::new(TracingLogger::default()), Vec::new());
//!     server.register_handler(Handler::from_fn("/health", |_req: Request| async {
//!         Response::text(StatusCode::OK, "ok")
//!     }));
//!
//!     server.start(ShutdownSignal::with_os_signals().recv()).await;
//!     Ok(())
//! }
//! ```
//!
//! ## Middleware order
//!
//! The middleware registered last wraps everything else:
//!
//! ```text
//! registered: [logging, auth]
//! request  → auth → logging → handler
//! response ← auth ← logging ←──┘
//! ```

#![doc(html_root_url = "https://docs.rs/sluice/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export telemetry types
pub use sluice_telemetry as telemetry;

// Re-export middleware types
pub use sluice_middleware as middleware;

// Re-export server types
pub use sluice_server as server;

// Re-export worker pool configuration
pub use sluice_worker as worker;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use sluice::prelude::*;
///
/// let config = PoolConfig::default();
/// assert!(config.validate().is_ok());
/// ```
pub mod prelude {
    pub use sluice_telemetry::{
        init_logging, LogConfig, Logger, MemoryLogger, NoopLogger, TelemetryError, TracingLogger,
    };

    pub use sluice_middleware::{
        from_fn, handler_fn, middleware_fn, Chain, HandlerFn, Middleware, Request, Response,
        ResponseExt,
    };

    pub use sluice_server::{
        Handler, Server, ServerConfig, ServerError, ServerState, ShutdownSignal,
    };

    pub use sluice_worker::{
        default_pool_config, resolve_strategy, PoolConfig, PoolSettings, Resizer, ResizingPolicy,
        ResizingStrategy, WorkerError,
    };
}
