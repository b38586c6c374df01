//! # Sluice Server
//!
//! Lifecycle-managed HTTP server for Sluice.
//!
//! - HTTP/1.1 via Hyper with a per-connection header read timeout
//! - Exact-path routing through [`ServeMux`]
//! - Middleware composed once at start, last-registered outermost
//! - Bounded graceful shutdown that runs at most once
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sluice_server::{Server, ServerConfig, ShutdownSignal};
//! use sluice_telemetry::TracingLogger;
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = Server::new(ServerConfig::default(), Arc::new(TracingLogger::default()), Vec::new());
//!     server.start(ShutdownSignal::with_os_signals().recv()).await;
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/sluice-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod handler;
pub mod mux;
pub mod server;
pub mod shutdown;

pub use config::{
    ServerConfig, ServerConfigBuilder, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_READ_HEADER_TIMEOUT,
    DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use error::{ServerError, ServerResult};
pub use handler::Handler;
pub use mux::ServeMux;
pub use server::{Server, ServerState};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
