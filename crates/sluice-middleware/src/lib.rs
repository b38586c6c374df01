//! # Sluice Middleware
//!
//! Handler and middleware composition for the Sluice HTTP server.
//!
//! Handlers are shared async functions from [`Request`] to [`Response`].
//! Middlewares are functions from a handler to a new handler that wraps it.
//! A [`Chain`] stores middlewares in registration order and composes them so
//! that the last-registered one is the outermost:
//!
//! ```text
//! registered:  [logging, metrics, auth]
//! request  →  auth → metrics → logging → handler
//! response ←  auth ← metrics ← logging ←──┘
//! ```
//!
//! ## Example
//!
//! ```
//! use sluice_middleware::{from_fn, handler_fn, Chain, HandlerFn, Request, Response, ResponseExt};
//! use http::StatusCode;
//!
//! let mut chain = Chain::new();
//! chain.push(from_fn(|req: Request, next: HandlerFn| async move { next(req).await }));
//!
//! let handler = chain.apply(handler_fn(|_req: Request| async {
//!     Response::text(StatusCode::OK, "ok")
//! }));
//! # let _ = handler;
//! ```

#![doc(html_root_url = "https://docs.rs/sluice-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chain;
pub mod types;

pub use chain::{compose, from_fn, middleware_fn, Chain, Middleware};
pub use types::{handler_fn, BoxFuture, HandlerFn, Request, Response, ResponseExt};
