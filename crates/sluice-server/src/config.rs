//! Server configuration types.
//!
//! # Example
//!
//! ```rust
//! use sluice_server::ServerConfig;
//! use std::time::Duration;
//!
//! let config = ServerConfig::builder()
//!     .host("127.0.0.1")
//!     .port(9090)
//!     .shutdown_timeout(Duration::from_secs(2))
//!     .build();
//!
//! assert_eq!(config.addr(), "127.0.0.1:9090");
//! ```

use std::time::Duration;

/// Default bind host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default bind port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default time allowed for a client to send request headers.
pub const DEFAULT_READ_HEADER_TIMEOUT: Duration = Duration::from_secs(10);

/// Default grace period for draining connections on shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP server configuration.
///
/// Use [`ServerConfig::builder()`] to construct instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host name or IP literal to bind
    host: String,

    /// TCP port; `0` lets the OS pick one
    port: u16,

    /// Per-connection limit for reading request headers
    read_header_timeout: Duration,

    /// Grace period for in-flight requests during shutdown
    shutdown_timeout: Duration,
}

impl ServerConfig {
    /// Creates a new server configuration builder.
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Returns the bind host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the bind port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the `host:port` bind address.
    ///
    /// IPv6 literals are bracketed.
    ///
    /// ```rust
    /// use sluice_server::ServerConfig;
    ///
    /// let config = ServerConfig::builder().host("::1").port(80).build();
    /// assert_eq!(config.addr(), "[::1]:80");
    /// ```
    #[must_use]
    pub fn addr(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Returns the header read timeout.
    #[must_use]
    pub fn read_header_timeout(&self) -> Duration {
        self.read_header_timeout
    }

    /// Returns the shutdown grace period.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Clone)]
pub struct ServerConfigBuilder {
    host: String,
    port: u16,
    read_header_timeout: Duration,
    shutdown_timeout: Duration,
}

impl ServerConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            read_header_timeout: DEFAULT_READ_HEADER_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Sets the bind host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the bind port.
    ///
    /// Ports are normally `1..=65535`. `0` is also accepted and asks the OS
    /// for a free port; read it back from
    /// [`Server::local_addr`](crate::Server::local_addr) once serving.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets how long a connection may take to deliver request headers.
    #[must_use]
    pub fn read_header_timeout(mut self, timeout: Duration) -> Self {
        self.read_header_timeout = timeout;
        self
    }

    /// Sets the graceful shutdown timeout.
    ///
    /// This is the maximum time the server waits for in-flight requests
    /// before closing the remaining connections.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Builds the [`ServerConfig`].
    #[must_use]
    pub fn build(self) -> ServerConfig {
        ServerConfig {
            host: self.host,
            port: self.port,
            read_header_timeout: self.read_header_timeout,
            shutdown_timeout: self.shutdown_timeout,
        }
    }
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
