//! The lifecycle-managed HTTP server.
//!
//! A [`Server`] owns a route registry and an ordered middleware list. On
//! [`start`](Server::start) it snapshots both into one composed handler,
//! binds a listener, serves every connection on its own task and then parks
//! on the caller's cancellation future. Shutdown drains connections within a
//! bounded grace period and runs at most once no matter how many callers ask
//! for it.
//!
//! ```text
//! Idle ──start──▶ Starting ──bound──▶ Serving ──cancel/stop──▶ Stopping ──▶ Stopped
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use http::StatusCode;
//! use sluice_middleware::{Request, Response, ResponseExt};
//! use sluice_server::{Handler, Server, ServerConfig, ShutdownSignal};
//! use sluice_telemetry::TracingLogger;
//!
//! # async fn run() {
//! let server = Server::new(
//!     ServerConfig::builder().port(8080).build(),
//!     Arc::new(TracingLogger::default()),
//!     Vec::new(),
//! );
//! server.register_handler(Handler::from_fn("/health", |_req: Request| async {
//!     Response::text(StatusCode::OK, "ok")
//! }));
//!
//! let shutdown = ShutdownSignal::with_os_signals();
//! server.start(shutdown.recv()).await;
//! # }
//! ```

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use parking_lot::{Mutex, RwLock};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;

use sluice_middleware::{Chain, HandlerFn, Middleware, Response, ResponseExt};
use sluice_telemetry::Logger;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::Handler;
use crate::mux::ServeMux;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Pause after a failed `accept` before trying again.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Lifecycle state of a [`Server`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerState {
    /// Constructed, never started.
    Idle,
    /// `start` is binding the listener.
    Starting,
    /// Accepting connections.
    Serving,
    /// Draining connections.
    Stopping,
    /// Shutdown finished.
    Stopped,
}

impl ServerState {
    /// Lowercase name of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Serving => "serving",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signals shared by the accept loop, its connections and the shutdown path.
#[derive(Debug, Clone, Default)]
struct Running {
    /// Stop accepting and let connections finish their current request.
    drain: ShutdownSignal,
    /// Drop whatever is still open.
    terminate: ShutdownSignal,
    tracker: ConnectionTracker,
}

/// HTTP server with composable middleware and a one-shot shutdown.
///
/// All methods take `&self`; share the server through an [`Arc`] to call
/// [`stop`](Self::stop) from other tasks while [`start`](Self::start) is
/// parked.
pub struct Server {
    config: ServerConfig,
    logger: Arc<dyn Logger>,
    mux: RwLock<ServeMux>,
    middlewares: RwLock<Chain>,
    state: Mutex<ServerState>,
    running: Mutex<Option<Running>>,
    accept_task: Mutex<Option<JoinHandle<()>>>,
    local_addr: OnceLock<SocketAddr>,
    closer: OnceCell<()>,
}

impl Server {
    /// Creates an idle server with an initial middleware sequence.
    pub fn new(
        config: ServerConfig,
        logger: Arc<dyn Logger>,
        middlewares: impl IntoIterator<Item = Middleware>,
    ) -> Self {
        Self {
            config,
            logger,
            mux: RwLock::new(ServeMux::new()),
            middlewares: RwLock::new(middlewares.into_iter().collect()),
            state: Mutex::new(ServerState::Idle),
            running: Mutex::new(None),
            accept_task: Mutex::new(None),
            local_addr: OnceLock::new(),
            closer: OnceCell::new(),
        }
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ServerState {
        *self.state.lock()
    }

    /// Returns the bound address once the listener is up.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    /// Number of registered paths.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.mux.read().len()
    }

    /// Number of registered middlewares.
    #[must_use]
    pub fn middleware_count(&self) -> usize {
        self.middlewares.read().len()
    }

    /// Registers a handler. A later registration for the same path replaces
    /// the earlier one.
    ///
    /// Handlers registered after `start` are not served.
    pub fn register_handler(&self, handler: Handler) {
        let (path, handler) = handler.into_parts();
        if self.mux.write().handle(path.clone(), handler).is_some() {
            tracing::debug!(path = %path, "Replaced handler");
        }
    }

    /// Appends a middleware; it becomes the outermost wrapper.
    ///
    /// Middlewares registered after `start` are stored but not applied to
    /// the running server.
    pub fn register_middleware(&self, middleware: Middleware) {
        self.middlewares.write().push(middleware);
        let state = self.state();
        if state != ServerState::Idle {
            self.logger.warn(
                "Middleware registered after start has no effect",
                &[("state", &state)],
            );
        }
    }

    /// Serves until `cancelled` resolves (or [`stop`](Self::stop) is called
    /// elsewhere), then shuts down and returns.
    ///
    /// Bind and accept failures are logged; they do not end this call. A
    /// second call on a server that is not idle is logged and returns at
    /// once.
    pub async fn start<F>(&self, cancelled: F)
    where
        F: Future<Output = ()>,
    {
        let Some(running) = self.begin() else {
            return;
        };

        let handler = self.compose();
        let addr = self.config.addr();

        match bind(&addr).await {
            Ok(listener) => self.launch(listener, &addr, handler, &running),
            Err(err) => self.logger.error("HTTP server error", &[("error", &err)]),
        }

        self.advance(ServerState::Starting, ServerState::Serving);

        tokio::select! {
            () = cancelled => {}
            () = running.drain.recv() => {}
        }

        self.stop().await;
    }

    /// Shuts the server down, waiting at most the configured grace period.
    ///
    /// Only the first call does any work; concurrent callers wait for it to
    /// finish and later callers return at once. Calling this before
    /// [`start`](Self::start) logs and returns without affecting a later
    /// start.
    pub async fn stop(&self) {
        if self.closer.initialized() {
            return;
        }
        if self.state() == ServerState::Idle {
            self.logger.info("HTTP server not started", &[]);
            return;
        }
        self.closer.get_or_init(|| self.shutdown()).await;
    }

    /// Moves Idle to Starting and creates the running handle.
    fn begin(&self) -> Option<Running> {
        let running = {
            let mut state = self.state.lock();
            if *state == ServerState::Idle {
                let running = Running::default();
                *self.running.lock() = Some(running.clone());
                *state = ServerState::Starting;
                Ok(running)
            } else {
                Err(ServerError::AlreadyStarted(*state))
            }
        };

        match running {
            Ok(running) => Some(running),
            Err(err) => {
                self.logger.error("HTTP server start rejected", &[("error", &err)]);
                None
            }
        }
    }

    /// Publishes the bound address and spawns the accept loop, unless a stop
    /// already began while the listener was being bound.
    fn launch(&self, listener: TcpListener, addr: &str, handler: HandlerFn, running: &Running) {
        if running.drain.is_triggered() {
            tracing::debug!(address = %addr, "Stopped while binding, closing listener");
            return;
        }

        let bound = listener.local_addr().ok();
        if let Some(bound) = bound {
            let _ = self.local_addr.set(bound);
        }
        self.logger
            .info("Starting HTTP server", &[("address", &DisplayAddr(addr, bound))]);

        let task = tokio::spawn(accept_loop(
            listener,
            handler,
            self.config.read_header_timeout(),
            running.clone(),
            Arc::clone(&self.logger),
        ));
        *self.accept_task.lock() = Some(task);
    }

    fn compose(&self) -> HandlerFn {
        let base = self.mux.read().to_handler();
        self.middlewares.read().apply(base)
    }

    /// Sets `to` only if the state is still `from`.
    fn advance(&self, from: ServerState, to: ServerState) {
        let mut state = self.state.lock();
        if *state == from {
            *state = to;
        }
    }

    async fn shutdown(&self) {
        let Some(running) = self.running.lock().clone() else {
            return;
        };
        *self.state.lock() = ServerState::Stopping;

        let grace = self.config.shutdown_timeout();
        running.drain.trigger();

        let accept_task = self.accept_task.lock().take();
        let drained = tokio::time::timeout(grace, async {
            if let Some(task) = accept_task {
                if let Err(e) = task.await {
                    tracing::warn!(error = %e, "Accept loop ended abnormally");
                }
            }
            running.tracker.wait_for_shutdown().await;
        })
        .await;

        if drained.is_ok() {
            self.logger.info("HTTP server gracefully stopped", &[]);
        } else {
            let err = ServerError::shutdown_timeout(grace, running.tracker.active_connections());
            self.logger.error("HTTP server shutdown error", &[("error", &err)]);
            running.terminate.trigger();
        }

        *self.state.lock() = ServerState::Stopped;
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("local_addr", &self.local_addr())
            .field("mux", &*self.mux.read())
            .field("middlewares", &*self.middlewares.read())
            .finish_non_exhaustive()
    }
}

/// Prints the resolved address when known, the configured one otherwise.
struct DisplayAddr<'a>(&'a str, Option<SocketAddr>);

impl fmt::Display for DisplayAddr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.1 {
            Some(bound) => write!(f, "{bound}"),
            None => f.write_str(self.0),
        }
    }
}

async fn bind(addr: &str) -> ServerResult<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::bind(addr, source))
}

async fn accept_loop(
    listener: TcpListener,
    handler: HandlerFn,
    read_header_timeout: Duration,
    running: Running,
    logger: Arc<dyn Logger>,
) {
    loop {
        tokio::select! {
            biased;

            () = running.drain.recv() => break,

            result = listener.accept() => match result {
                Ok((stream, remote_addr)) => {
                    let token = running.tracker.acquire();
                    let handler = Arc::clone(&handler);
                    let running = running.clone();

                    tokio::spawn(async move {
                        if let Err(e) = serve_connection(stream, handler, read_header_timeout, &running).await {
                            tracing::debug!(remote = %remote_addr, error = %e, "Connection error");
                        }
                        drop(token);
                    });
                }
                Err(e) => {
                    logger.error("HTTP server error", &[("error", &ServerError::Accept(e))]);
                    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                }
            },
        }
    }
}

async fn serve_connection(
    stream: TcpStream,
    handler: HandlerFn,
    read_header_timeout: Duration,
    running: &Running,
) -> Result<(), hyper::Error> {
    let io = TokioIo::new(stream);
    let service = service_fn(move |request: http::Request<Incoming>| {
        let handler = Arc::clone(&handler);
        async move { Ok::<_, Infallible>(dispatch(handler, request).await) }
    });

    let mut builder = http1::Builder::new();
    builder
        .timer(TokioTimer::new())
        .header_read_timeout(read_header_timeout);
    let conn = builder.serve_connection(io, service);
    tokio::pin!(conn);

    tokio::select! {
        result = conn.as_mut() => return result,
        () = running.terminate.recv() => return Ok(()),
        () = running.drain.recv() => {}
    }

    conn.as_mut().graceful_shutdown();

    tokio::select! {
        result = conn.as_mut() => result,
        () = running.terminate.recv() => Ok(()),
    }
}

/// Collects the body and runs the composed handler.
async fn dispatch(handler: HandlerFn, request: http::Request<Incoming>) -> Response {
    let (parts, body) = request.into_parts();
    match body.collect().await {
        Ok(collected) => {
            let request = http::Request::from_parts(parts, Full::new(collected.to_bytes()));
            handler(request).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to read request body");
            Response::text(StatusCode::BAD_REQUEST, "400 bad request\n")
        }
    }
}
