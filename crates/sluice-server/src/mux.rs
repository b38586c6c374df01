//! Exact-path request multiplexer.
//!
//! [`ServeMux`] maps request paths to handlers. Matching is by exact path
//! equality; there are no parameters, prefixes or method filters. Unmatched
//! requests receive `404 page not found`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use sluice_middleware::{handler_fn, HandlerFn, Request, Response, ResponseExt};

/// Registry of path handlers.
#[derive(Clone, Default)]
pub struct ServeMux {
    routes: HashMap<String, HandlerFn>,
}

impl ServeMux {
    /// Creates an empty multiplexer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `path`, returning the handler it replaced.
    pub fn handle(&mut self, path: impl Into<String>, handler: HandlerFn) -> Option<HandlerFn> {
        self.routes.insert(path.into(), handler)
    }

    /// Looks up the handler for an exact path.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&HandlerFn> {
        self.routes.get(path)
    }

    /// Number of registered paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no path is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Registered paths in arbitrary order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    /// Freezes the current routes into a dispatching handler.
    ///
    /// Later changes to `self` are not visible to the returned handler.
    #[must_use]
    pub fn to_handler(&self) -> HandlerFn {
        let routes = Arc::new(self.routes.clone());
        handler_fn(move |request: Request| {
            let handler = routes.get(request.uri().path()).cloned();
            async move {
                match handler {
                    Some(handler) => handler(request).await,
                    None => Response::not_found(),
                }
            }
        })
    }
}

impl fmt::Debug for ServeMux {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut paths: Vec<_> = self.paths().collect();
        paths.sort_unstable();
        f.debug_struct("ServeMux").field("paths", &paths).finish()
    }
}
