//! End-to-end tests that run the same routes through both engines.
//!
//! Most tests go through [`TestClient`]; the socket tests bind a real
//! listener and talk to it with a hyper client.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use portico_core::{Request, Response, RouteError};
use portico_middleware::{handler_fn, middleware_fn, Flow};
use portico_server::{
    Controller, Engine, ExpressEngine, HapiEngine, RouteConfig, RouteDeclaration, Server,
    ServerConfig, ServerError,
};
use portico_test::TestClient;
use serde_json::json;

// ============================================================================
// Fixtures
// ============================================================================

fn get_item(calls: Arc<AtomicUsize>) -> RouteConfig {
    RouteConfig::builder(
        Method::GET,
        "/items/:id",
        handler_fn(move |request: Request, response: Response| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                let id = request.param("id").unwrap_or_default().to_string();
                Ok(response.with_body(json!({ "id": id, "params": request.params() })))
            }
        }),
    )
    .method_name("getItem")
    .build()
    .unwrap()
}

fn denied_item(calls: Arc<AtomicUsize>) -> RouteConfig {
    RouteConfig::builder(
        Method::GET,
        "/secret/:id",
        handler_fn(move |_request: Request, response: Response| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(response)
            }
        }),
    )
    .middleware(middleware_fn("deny", |_request, _response| async move {
        Err::<Flow, _>(RouteError::new("denied"))
    }))
    .build()
    .unwrap()
}

fn local_config() -> ServerConfig {
    ServerConfig::builder()
        .host("127.0.0.1")
        .port(0)
        .shutdown_timeout(Duration::from_secs(1))
        .build()
}

fn server_with_items<E: Engine>(engine: E, calls: &Arc<AtomicUsize>) -> Server<E> {
    let mut server = Server::new(engine, local_config());
    server
        .register(get_item(Arc::clone(calls)))
        .unwrap()
        .register(denied_item(Arc::clone(calls)))
        .unwrap();
    server
}

// ============================================================================
// Scenarios shared by both engines
// ============================================================================

async fn assert_param_route<E: Engine>(engine: E) {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut server = server_with_items(engine, &calls);
    let client = TestClient::from_server(&mut server).unwrap();

    let response = client.get("/items/7").send().await.unwrap();
    response
        .assert_status(StatusCode::OK)
        .assert_header("content-type", "application/json")
        .assert_json_eq(&json!({ "id": "7", "params": { "id": "7" } }));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

async fn assert_failing_middleware<E: Engine>(engine: E) {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut server = server_with_items(engine, &calls);
    let client = TestClient::from_server(&mut server).unwrap();

    let response = client.get("/secret/1").send().await.unwrap();
    response
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR)
        .assert_body_eq("denied");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

async fn assert_error_status_is_kept<E: Engine>(engine: E) {
    let mut server = Server::new(engine, local_config());
    server
        .register(
            RouteConfig::builder(
                Method::DELETE,
                "/items/:id",
                handler_fn(|_request, _response| async move {
                    Err(RouteError::with_status(StatusCode::FORBIDDEN, json!({ "error": "read only" })))
                }),
            )
            .build()
            .unwrap(),
        )
        .unwrap();
    let client = TestClient::from_server(&mut server).unwrap();

    client
        .delete("/items/3")
        .send()
        .await
        .unwrap()
        .assert_status(StatusCode::FORBIDDEN)
        .assert_json_eq(&json!({ "error": "read only" }));
}

async fn assert_header_order<E: Engine>(engine: E) {
    let mut server = Server::new(engine, local_config());
    server
        .register(
            RouteConfig::builder(
                Method::GET,
                "/ordered",
                handler_fn(|_request, response: Response| async move {
                    Ok(response
                        .with_status(StatusCode::ACCEPTED)
                        .with_header("x-second", "b")
                        .with_header("x-first", "a")
                        .with_body("ok"))
                }),
            )
            .middleware(middleware_fn("tag", |request, response: Response| async move {
                Ok(Flow::Next(request, response.with_header("x-tag", "mw")))
            }))
            .build()
            .unwrap(),
        )
        .unwrap();
    let client = TestClient::from_server(&mut server).unwrap();

    let response = client.get("/ordered").send().await.unwrap();
    response.assert_status(StatusCode::ACCEPTED).assert_body_eq("ok");
    assert_eq!(
        &response.header_names()[..3],
        &["x-tag", "x-second", "x-first"]
    );
}

async fn assert_static_beats_param<E: Engine>(engine: E) {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut server = server_with_items(engine, &calls);
    server
        .register(
            RouteConfig::builder(
                Method::GET,
                "/items/new",
                handler_fn(|_request, response: Response| async move { Ok(response.with_body("form")) }),
            )
            .build()
            .unwrap(),
        )
        .unwrap();

    let paths: Vec<_> = server.routes().iter().map(|route| route.path()).collect();
    assert_eq!(paths, vec!["/items/:id", "/secret/:id", "/items/new"]);

    let client = TestClient::from_server(&mut server).unwrap();
    client.get("/items/new").send().await.unwrap().assert_body_eq("form");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

async fn assert_method_mismatch<E: Engine>(engine: E) {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut server = server_with_items(engine, &calls);
    let client = TestClient::from_server(&mut server).unwrap();

    let response = client.post("/items/7").send().await.unwrap();
    assert!(response.status().is_client_error());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

async fn assert_panicking_middleware<E: Engine>(engine: E) {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut server = Server::new(engine, local_config());
    server
        .register(
            RouteConfig::builder(
                Method::GET,
                "/boom",
                handler_fn({
                    let calls = Arc::clone(&calls);
                    move |_request, response| {
                        let calls = Arc::clone(&calls);
                        async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            Ok(response)
                        }
                    }
                }),
            )
            .middleware(middleware_fn("explode", |request, response| async move {
                if request.path() == "/boom" {
                    panic!("stage exploded");
                }
                Ok(Flow::Next(request, response))
            }))
            .build()
            .unwrap(),
        )
        .unwrap();
    let client = TestClient::from_server(&mut server).unwrap();

    client
        .get("/boom")
        .send()
        .await
        .unwrap()
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR)
        .assert_body_eq("stage exploded");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_panicking_middleware_express() {
    assert_panicking_middleware(ExpressEngine::new()).await;
}

#[tokio::test]
async fn test_panicking_middleware_hapi() {
    assert_panicking_middleware(HapiEngine::new()).await;
}

#[tokio::test]
async fn test_param_route_express() {
    assert_param_route(ExpressEngine::new()).await;
}

#[tokio::test]
async fn test_param_route_hapi() {
    assert_param_route(HapiEngine::new()).await;
}

#[tokio::test]
async fn test_failing_middleware_express() {
    assert_failing_middleware(ExpressEngine::new()).await;
}

#[tokio::test]
async fn test_failing_middleware_hapi() {
    assert_failing_middleware(HapiEngine::new()).await;
}

#[tokio::test]
async fn test_error_status_is_kept_express() {
    assert_error_status_is_kept(ExpressEngine::new()).await;
}

#[tokio::test]
async fn test_error_status_is_kept_hapi() {
    assert_error_status_is_kept(HapiEngine::new()).await;
}

#[tokio::test]
async fn test_header_order_express() {
    assert_header_order(ExpressEngine::new()).await;
}

#[tokio::test]
async fn test_header_order_hapi() {
    assert_header_order(HapiEngine::new()).await;
}

#[tokio::test]
async fn test_static_beats_param_express() {
    assert_static_beats_param(ExpressEngine::new()).await;
}

#[tokio::test]
async fn test_static_beats_param_hapi() {
    assert_static_beats_param(HapiEngine::new()).await;
}

#[tokio::test]
async fn test_method_mismatch_express() {
    assert_method_mismatch(ExpressEngine::new()).await;
}

#[tokio::test]
async fn test_method_mismatch_hapi() {
    assert_method_mismatch(HapiEngine::new()).await;
}

// ============================================================================
// Engine differences
// ============================================================================

fn serve_file() -> RouteConfig {
    RouteConfig::builder(
        Method::GET,
        "/files/*path",
        handler_fn(|request: Request, response: Response| async move {
            Ok(response.with_body(request.param("path").unwrap_or_default().to_string()))
        }),
    )
    .build()
    .unwrap()
}

#[tokio::test]
async fn test_catch_all_only_on_express() {
    let mut express = Server::new(ExpressEngine::new(), local_config());
    express.register(serve_file()).unwrap();
    let client = TestClient::from_server(&mut express).unwrap();
    client
        .get("/files/docs/readme.md")
        .send()
        .await
        .unwrap()
        .assert_status(StatusCode::OK)
        .assert_body_eq("docs/readme.md");

    let mut hapi = Server::new(HapiEngine::new(), local_config());
    let err = hapi.register(serve_file()).unwrap_err();
    assert!(matches!(err, ServerError::Registration { .. }));
    assert!(hapi.routes().is_empty());
}

struct FilesController;

impl Controller for FilesController {
    fn base_path(&self) -> &str {
        "/files"
    }

    fn routes(&self) -> Vec<RouteDeclaration> {
        vec![
            RouteDeclaration::get(
                "/",
                "listFiles",
                handler_fn(|_request, response: Response| async move { Ok(response.with_body("list")) }),
            ),
            RouteDeclaration::get(
                "/*path",
                "serveFile",
                handler_fn(|request: Request, response: Response| async move {
                    Ok(response.with_body(request.param("path").unwrap_or_default().to_string()))
                }),
            ),
        ]
    }
}

#[tokio::test]
async fn test_rejected_controller_never_serves() {
    let mut hapi = Server::new(HapiEngine::new(), local_config());
    let err = hapi.register_controller(&FilesController).unwrap_err();
    assert!(matches!(err, ServerError::Registration { .. }));
    assert!(hapi.routes().is_empty());

    let client = TestClient::from_server(&mut hapi).unwrap();
    client.get("/files").send().await.unwrap().assert_status(StatusCode::NOT_FOUND);

    let err = hapi.start().await.unwrap_err();
    assert!(matches!(err, ServerError::RegistrationFailed { .. }));
    assert!(hapi.local_addr().is_none());

    let mut express = Server::new(ExpressEngine::new(), local_config());
    express.register_controller(&FilesController).unwrap();
    assert_eq!(express.routes().len(), 2);
}

#[tokio::test]
async fn test_unmatched_path_is_404_on_both() {
    let calls = Arc::new(AtomicUsize::new(0));

    let mut express = server_with_items(ExpressEngine::new(), &calls);
    let client = TestClient::from_server(&mut express).unwrap();
    client.get("/nope").send().await.unwrap().assert_status(StatusCode::NOT_FOUND);

    let mut hapi = server_with_items(HapiEngine::new(), &calls);
    let client = TestClient::from_server(&mut hapi).unwrap();
    client.get("/nope").send().await.unwrap().assert_status(StatusCode::NOT_FOUND);
}

// ============================================================================
// Real sockets
// ============================================================================

async fn fetch(addr: std::net::SocketAddr, path: &str) -> (StatusCode, Bytes) {
    let stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .unwrap();
    tokio::spawn(conn);

    let request = http::Request::builder()
        .uri(path)
        .header("host", addr.to_string())
        .body(Full::new(Bytes::new()))
        .unwrap();
    let response = sender.send_request(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body)
}

async fn assert_served_over_socket<E: Engine>(engine: E) {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut server = server_with_items(engine, &calls);
    server.start().await.unwrap();

    let addr = server.local_addr().unwrap();
    assert_ne!(addr.port(), 0);
    assert_eq!(server.host(), format!("http://{addr}"));

    let (status, body) = fetch(addr, "/items/42").await;
    assert_eq!(status, StatusCode::OK);
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["id"], "42");

    server.shutdown().await;
    assert!(tokio::net::TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_socket_express() {
    assert_served_over_socket(ExpressEngine::new()).await;
}

#[tokio::test]
async fn test_socket_hapi() {
    assert_served_over_socket(HapiEngine::new()).await;
}

#[tokio::test]
async fn test_port_in_use() {
    let occupied = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = occupied.local_addr().unwrap().port();

    let config = ServerConfig::builder().host("127.0.0.1").port(port).build();
    let mut server = Server::new(ExpressEngine::new(), config);
    let err = server.start().await.unwrap_err();

    assert!(matches!(err, ServerError::Bind { .. }));
    assert!(!server.is_started());
}
