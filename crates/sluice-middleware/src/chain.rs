//! Middleware composition.
//!
//! A [`Middleware`] is a plain function value: it receives the handler it
//! wraps and returns a new handler. A [`Chain`] keeps middlewares in
//! registration order and folds them around a base handler on demand.
//!
//! # Ordering
//!
//! The middleware registered **last** is the **outermost** wrapper. For a
//! chain `[a, b, c]` around handler `h` the effective handler is
//! `c(b(a(h)))`: `c` sees the request first and the response last.
//!
//! ```text
//! request → c → b → a → h
//! response ← c ← b ← a ←┘
//! ```
//!
//! Registering an authentication middleware after a logging middleware
//! therefore makes authentication run before logging ever sees the request.

use std::future::Future;
use std::sync::Arc;

use crate::types::{BoxFuture, HandlerFn, Request, Response};

/// A handler-wrapping function.
pub type Middleware = Arc<dyn Fn(HandlerFn) -> HandlerFn + Send + Sync>;

/// Wraps a closure into a [`Middleware`].
pub fn middleware_fn<F>(f: F) -> Middleware
where
    F: Fn(HandlerFn) -> HandlerFn + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Builds a [`Middleware`] from an async function receiving the request and
/// the wrapped handler.
///
/// The function decides whether and when to call `next`; skipping it
/// short-circuits everything inside.
///
/// # Example
///
/// ```rust
/// use sluice_middleware::{from_fn, Request, HandlerFn};
///
/// let timing = from_fn(|request: Request, next: HandlerFn| async move {
///     let started = std::time::Instant::now();
///     let response = next(request).await;
///     let _elapsed = started.elapsed();
///     response
/// });
/// ```
pub fn from_fn<F, Fut>(f: F) -> Middleware
where
    F: Fn(Request, HandlerFn) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    let f = Arc::new(f);
    Arc::new(move |next: HandlerFn| -> HandlerFn {
        let f = Arc::clone(&f);
        Arc::new(move |request: Request| -> BoxFuture<'static, Response> {
            Box::pin(f(request, Arc::clone(&next)))
        })
    })
}

/// Wraps `base` with `middlewares`, last element outermost.
///
/// The slice is only read; calling this twice yields two independent
/// handlers built from the same sequence.
pub fn compose(base: HandlerFn, middlewares: &[Middleware]) -> HandlerFn {
    middlewares
        .iter()
        .fold(base, |inner, middleware| middleware(inner))
}

/// An ordered sequence of middlewares.
#[derive(Clone, Default)]
pub struct Chain {
    middlewares: Vec<Middleware>,
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}

impl Chain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware; it becomes the new outermost wrapper.
    pub fn push(&mut self, middleware: Middleware) {
        self.middlewares.push(middleware);
    }

    /// Number of registered middlewares.
    #[must_use]
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    /// Whether no middleware is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Composes the chain around `base`. See [`compose`].
    #[must_use]
    pub fn apply(&self, base: HandlerFn) -> HandlerFn {
        compose(base, &self.middlewares)
    }
}

impl FromIterator<Middleware> for Chain {
    fn from_iter<I: IntoIterator<Item = Middleware>>(iter: I) -> Self {
        Self {
            middlewares: iter.into_iter().collect(),
        }
    }
}

impl Extend<Middleware> for Chain {
    fn extend<I: IntoIterator<Item = Middleware>>(&mut self, iter: I) {
        self.middlewares.extend(iter);
    }
}
