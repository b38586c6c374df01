//! Error types for the HTTP server.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::server::ServerState;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors reported by the lifecycle manager.
///
/// None of these escape [`Server::start`](crate::Server::start) or
/// [`Server::stop`](crate::Server::stop); they are routed to the logger.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Binding the listener failed.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that could not be bound.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Accepting a connection failed.
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    /// `start` was called on a server that already left the idle state.
    #[error("server already started (state: {0})")]
    AlreadyStarted(ServerState),

    /// Connections were still open when the grace period ran out.
    #[error("deadline exceeded after {grace:?} with {active} connection(s) open")]
    ShutdownTimeout {
        /// Grace period that elapsed.
        grace: Duration,
        /// Connections still open at the deadline.
        active: usize,
    },
}

impl ServerError {
    /// Create a bind error.
    pub fn bind(addr: impl Into<String>, source: io::Error) -> Self {
        Self::Bind {
            addr: addr.into(),
            source,
        }
    }

    /// Create a shutdown timeout error.
    #[must_use]
    pub fn shutdown_timeout(grace: Duration, active: usize) -> Self {
        Self::ShutdownTimeout { grace, active }
    }
}
