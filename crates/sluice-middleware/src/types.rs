//! Request, response and handler types shared by the chain and the server.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http::{header, StatusCode};
use http_body_util::Full;

/// The HTTP request type seen by handlers.
///
/// The body is fully collected before the handler runs.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type produced by handlers.
pub type Response = http::Response<Full<Bytes>>;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A type-erased, shareable request handler.
pub type HandlerFn = Arc<dyn Fn(Request) -> BoxFuture<'static, Response> + Send + Sync>;

/// Wraps an async function into a [`HandlerFn`].
///
/// # Example
///
/// ```rust
/// use sluice_middleware::{handler_fn, Request, Response, ResponseExt};
/// use http::StatusCode;
///
/// let handler = handler_fn(|_req: Request| async { Response::text(StatusCode::OK, "pong") });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |request: Request| -> BoxFuture<'static, Response> { Box::pin(f(request)) })
}

/// Shorthand constructors for plain-text responses.
pub trait ResponseExt {
    /// A `text/plain` response with the given status and body.
    fn text(status: StatusCode, body: impl Into<Bytes>) -> Response;

    /// The `404 page not found` response used for unmatched paths.
    fn not_found() -> Response;
}

impl ResponseExt for Response {
    fn text(status: StatusCode, body: impl Into<Bytes>) -> Response {
        let mut response = http::Response::new(Full::new(body.into()));
        *response.status_mut() = status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
    }

    fn not_found() -> Response {
        Self::text(StatusCode::NOT_FOUND, "404 page not found\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_handler_fn_invocation() {
        let handler = handler_fn(|req: Request| async move {
            Response::text(StatusCode::OK, format!("path={}", req.uri().path()))
        });

        let request = http::Request::builder()
            .uri("/ping")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let response = handler(request).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, Bytes::from("path=/ping"));
    }

    #[test]
    fn test_text_response() {
        let response = Response::text(StatusCode::ACCEPTED, "queued");
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn test_not_found_response() {
        let response = Response::not_found();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
