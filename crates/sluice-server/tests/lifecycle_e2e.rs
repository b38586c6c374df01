//! End-to-end lifecycle tests over real TCP connections.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http::{header, StatusCode};
use http_body_util::{BodyExt, Empty};
use hyper_util::rt::TokioIo;
use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use sluice_middleware::{from_fn, HandlerFn, Middleware, Request, Response, ResponseExt};
use sluice_server::{Handler, Server, ServerConfig, ServerState, ShutdownSignal};
use sluice_telemetry::{Level, Logger, MemoryLogger};

type Trace = Arc<Mutex<Vec<String>>>;

fn config(grace: Duration) -> ServerConfig {
    ServerConfig::builder()
        .host("127.0.0.1")
        .port(0)
        .shutdown_timeout(grace)
        .build()
}

fn new_server(grace: Duration, middlewares: Vec<Middleware>) -> (Arc<Server>, Arc<MemoryLogger>) {
    let logger = Arc::new(MemoryLogger::new());
    let server = Server::new(config(grace), Arc::clone(&logger) as Arc<dyn Logger>, middlewares);
    (Arc::new(server), logger)
}

fn spawn_start(server: &Arc<Server>, cancel: &ShutdownSignal) -> JoinHandle<()> {
    let server = Arc::clone(server);
    let cancel = cancel.clone();
    tokio::spawn(async move { server.start(cancel.recv()).await })
}

async fn bound_addr(server: &Server) -> SocketAddr {
    for _ in 0..400 {
        if let Some(addr) = server.local_addr() {
            return addr;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("server never bound");
}

async fn get(addr: SocketAddr, path: &str) -> Result<(StatusCode, String), hyper::Error> {
    let stream = TcpStream::connect(addr).await.expect("connect");
    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream)).await?;
    tokio::spawn(async move {
        let _ = conn.await;
    });

    let request = http::Request::builder()
        .uri(path)
        .header(header::HOST, "localhost")
        .body(Empty::<Bytes>::new())
        .expect("request");
    let response = sender.send_request(request).await?;
    let status = response.status();
    let body = response.into_body().collect().await?.to_bytes();
    Ok((status, String::from_utf8_lossy(&body).into_owned()))
}

fn recorder(name: &'static str, trace: &Trace) -> Middleware {
    let trace = Arc::clone(trace);
    from_fn(move |request: Request, next: HandlerFn| {
        let trace = Arc::clone(&trace);
        async move {
            trace.lock().push(format!("enter:{name}"));
            let response = next(request).await;
            trace.lock().push(format!("leave:{name}"));
            response
        }
    })
}

fn text_handler(path: &str, body: &'static str) -> Handler {
    Handler::from_fn(path, move |_req: Request| async move { Response::text(StatusCode::OK, body) })
}

async fn finish(task: JoinHandle<()>, within: Duration) {
    tokio::time::timeout(within, task)
        .await
        .expect("start did not return in time")
        .expect("start panicked");
}

#[tokio::test]
async fn middleware_order_holds_on_live_requests() {
    let trace = Trace::default();
    let (server, _logger) = new_server(Duration::from_secs(1), vec![recorder("a", &trace)]);
    server.register_middleware(recorder("b", &trace));
    server.register_middleware(recorder("c", &trace));

    let handler_trace = Arc::clone(&trace);
    server.register_handler(Handler::from_fn("/", move |_req: Request| {
        let trace = Arc::clone(&handler_trace);
        async move {
            trace.lock().push("handler".to_string());
            Response::text(StatusCode::OK, "root")
        }
    }));

    let cancel = ShutdownSignal::new();
    let task = spawn_start(&server, &cancel);
    let addr = bound_addr(&server).await;

    let (status, body) = get(addr, "/").await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "root");
    assert_eq!(
        *trace.lock(),
        vec!["enter:c", "enter:b", "enter:a", "handler", "leave:a", "leave:b", "leave:c"]
    );

    cancel.trigger();
    finish(task, Duration::from_secs(2)).await;
}

#[tokio::test]
async fn routes_use_last_registration_and_404_otherwise() {
    let (server, _logger) = new_server(Duration::from_secs(1), Vec::new());
    server.register_handler(text_handler("/p", "first"));
    server.register_handler(text_handler("/p", "second"));

    let cancel = ShutdownSignal::new();
    let task = spawn_start(&server, &cancel);
    let addr = bound_addr(&server).await;

    assert_eq!(get(addr, "/p").await.unwrap(), (StatusCode::OK, "second".to_string()));

    let (status, body) = get(addr, "/missing").await.unwrap();
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "404 page not found\n");

    cancel.trigger();
    finish(task, Duration::from_secs(2)).await;
}

#[tokio::test]
async fn handlers_registered_after_start_are_not_served() {
    let (server, _logger) = new_server(Duration::from_secs(1), Vec::new());
    let cancel = ShutdownSignal::new();
    let task = spawn_start(&server, &cancel);
    let addr = bound_addr(&server).await;

    server.register_handler(text_handler("/late", "late"));
    let (status, _) = get(addr, "/late").await.unwrap();
    assert_eq!(status, StatusCode::NOT_FOUND);

    cancel.trigger();
    finish(task, Duration::from_secs(2)).await;
}

#[tokio::test]
async fn concurrent_stops_run_shutdown_once() {
    let (server, logger) = new_server(Duration::from_secs(1), Vec::new());
    let cancel = ShutdownSignal::new();
    let task = spawn_start(&server, &cancel);
    bound_addr(&server).await;

    let stoppers: Vec<_> = (0..16)
        .map(|_| {
            let server = Arc::clone(&server);
            tokio::spawn(async move { server.stop().await })
        })
        .collect();
    for stopper in stoppers {
        stopper.await.unwrap();
    }
    cancel.trigger();
    finish(task, Duration::from_secs(2)).await;

    server.stop().await;

    assert_eq!(server.state(), ServerState::Stopped);
    assert_eq!(logger.count("HTTP server gracefully stopped"), 1);
    assert_eq!(logger.count("HTTP server shutdown error"), 0);
}

#[tokio::test]
async fn stop_before_start_leaves_server_startable() {
    let (server, logger) = new_server(Duration::from_secs(1), Vec::new());
    server.register_handler(text_handler("/ping", "pong"));

    server.stop().await;
    assert!(logger.contains("HTTP server not started"));
    assert_eq!(server.state(), ServerState::Idle);

    let cancel = ShutdownSignal::new();
    let task = spawn_start(&server, &cancel);
    let addr = bound_addr(&server).await;
    assert_eq!(get(addr, "/ping").await.unwrap().1, "pong");

    cancel.trigger();
    finish(task, Duration::from_secs(2)).await;
    assert_eq!(logger.count("HTTP server gracefully stopped"), 1);
}

#[tokio::test]
async fn in_flight_request_completes_within_grace() {
    let (server, logger) = new_server(Duration::from_secs(2), Vec::new());
    let entered = Arc::new(Notify::new());
    let signal = Arc::clone(&entered);
    server.register_handler(Handler::from_fn("/slow", move |_req: Request| {
        let signal = Arc::clone(&signal);
        async move {
            signal.notify_one();
            tokio::time::sleep(Duration::from_millis(150)).await;
            Response::text(StatusCode::OK, "done")
        }
    }));

    let cancel = ShutdownSignal::new();
    let task = spawn_start(&server, &cancel);
    let addr = bound_addr(&server).await;

    let client = tokio::spawn(async move { get(addr, "/slow").await });
    entered.notified().await;
    cancel.trigger();

    let (status, body) = client.await.unwrap().unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "done");

    finish(task, Duration::from_secs(3)).await;
    assert_eq!(logger.count("HTTP server gracefully stopped"), 1);
}

#[tokio::test]
async fn start_returns_after_grace_when_handler_hangs() {
    let grace = Duration::from_millis(200);
    let (server, logger) = new_server(grace, Vec::new());
    let entered = Arc::new(Notify::new());
    let signal = Arc::clone(&entered);
    server.register_handler(Handler::from_fn("/hang", move |_req: Request| {
        let signal = Arc::clone(&signal);
        async move {
            signal.notify_one();
            tokio::time::sleep(Duration::from_secs(60)).await;
            Response::text(StatusCode::OK, "never")
        }
    }));

    let cancel = ShutdownSignal::new();
    let task = spawn_start(&server, &cancel);
    let addr = bound_addr(&server).await;

    let client = tokio::spawn(async move { get(addr, "/hang").await });
    entered.notified().await;

    let started = Instant::now();
    cancel.trigger();
    finish(task, Duration::from_secs(5)).await;

    assert!(started.elapsed() >= grace);
    assert!(started.elapsed() < grace + Duration::from_secs(2));
    assert_eq!(server.state(), ServerState::Stopped);

    let errors = logger.records_at(Level::Error);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "HTTP server shutdown error");
    assert!(errors[0].field("error").unwrap().contains("deadline exceeded"));
    assert!(!logger.contains("HTTP server gracefully stopped"));

    let outcome = tokio::time::timeout(Duration::from_secs(2), client)
        .await
        .expect("client should observe the closed connection")
        .unwrap();
    assert!(outcome.is_err());
}

#[tokio::test]
async fn second_start_is_rejected() {
    let (server, logger) = new_server(Duration::from_secs(1), Vec::new());
    server.register_handler(text_handler("/", "up"));

    let cancel = ShutdownSignal::new();
    let task = spawn_start(&server, &cancel);
    let addr = bound_addr(&server).await;

    tokio::time::timeout(Duration::from_secs(1), server.start(std::future::pending()))
        .await
        .expect("second start should return immediately");

    let errors = logger.records_at(Level::Error);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "HTTP server start rejected");
    assert_eq!(server.state(), ServerState::Serving);
    assert_eq!(get(addr, "/").await.unwrap().1, "up");

    cancel.trigger();
    finish(task, Duration::from_secs(2)).await;
}

#[tokio::test]
async fn incomplete_headers_are_dropped_after_read_timeout() {
    let logger = Arc::new(MemoryLogger::new());
    let config = ServerConfig::builder()
        .host("127.0.0.1")
        .port(0)
        .read_header_timeout(Duration::from_millis(300))
        .shutdown_timeout(Duration::from_secs(1))
        .build();
    let server = Arc::new(Server::new(config, Arc::clone(&logger) as Arc<dyn Logger>, Vec::new()));
    server.register_handler(text_handler("/", "up"));

    let cancel = ShutdownSignal::new();
    let task = spawn_start(&server, &cancel);
    let addr = bound_addr(&server).await;

    let mut stream = TcpStream::connect(addr).await.expect("connect");
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: x\r\n")
        .await
        .expect("write partial headers");

    let started = Instant::now();
    let mut received = Vec::new();
    let read = tokio::time::timeout(Duration::from_secs(2), stream.read_to_end(&mut received))
        .await
        .expect("server should close the stalled connection");

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(250), "closed too early: {elapsed:?}");
    assert!(elapsed < Duration::from_millis(1500), "closed too late: {elapsed:?}");
    assert!(
        read.is_err() || !String::from_utf8_lossy(&received).contains("200 OK"),
        "stalled request must not reach the handler"
    );

    cancel.trigger();
    finish(task, Duration::from_secs(2)).await;
}
