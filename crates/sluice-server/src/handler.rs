//! Path-bound handlers.

use std::fmt;
use std::future::Future;

use sluice_middleware::{handler_fn, HandlerFn, Request, Response};

/// A request handler bound to an exact path.
///
/// # Example
///
/// ```rust
/// use sluice_server::Handler;
/// use sluice_middleware::{Request, Response, ResponseExt};
/// use http::StatusCode;
///
/// let health = Handler::from_fn("/health", |_req: Request| async {
///     Response::text(StatusCode::OK, "ok")
/// });
/// assert_eq!(health.path(), "/health");
/// ```
#[derive(Clone)]
pub struct Handler {
    path: String,
    handler: HandlerFn,
}

impl Handler {
    /// Binds an already type-erased handler to `path`.
    pub fn new(path: impl Into<String>, handler: HandlerFn) -> Self {
        Self {
            path: path.into(),
            handler,
        }
    }

    /// Binds an async function to `path`.
    pub fn from_fn<F, Fut>(path: impl Into<String>, f: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        Self::new(path, handler_fn(f))
    }

    /// The path this handler serves.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The handler function.
    #[must_use]
    pub fn handler(&self) -> &HandlerFn {
        &self.handler
    }

    /// Splits into path and handler function.
    #[must_use]
    pub fn into_parts(self) -> (String, HandlerFn) {
        (self.path, self.handler)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").field("path", &self.path).finish_non_exhaustive()
    }
}
