//! End-to-end call stack tests.
//!
//! These tests compose global, controller and route stages the way a
//! server does and check ordering, short-circuiting and failure.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use http::{Method, StatusCode};
use portico_core::{Request, Response, RouteError};
use portico_middleware::{
    handler_fn, middleware_fn, stages::DebugLog, CallStack, Flow, Handler, Middleware,
};
use serde_json::json;

/// Records the name of every stage that runs.
fn recording(name: &'static str, trail: Arc<Mutex<Vec<&'static str>>>) -> Arc<dyn Middleware> {
    Arc::new(middleware_fn(name, move |request, response| {
        let trail = Arc::clone(&trail);
        async move {
            trail.lock().unwrap().push(name);
            Ok(Flow::Next(request, response))
        }
    }))
}

/// A handler that counts its invocations and echoes the `id` param.
fn counting_handler(calls: Arc<AtomicUsize>) -> impl Handler {
    handler_fn(move |request, response| {
        let calls = Arc::clone(&calls);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            let id = request.param("id").unwrap_or_default().to_string();
            Ok(response.with_body(json!({ "id": id })))
        }
    })
}

fn items_request() -> Request {
    Request::new(Method::GET, "/items/7").with_param("id", "7")
}

// ============================================================================
// Ordering
// ============================================================================

#[tokio::test]
async fn test_global_then_controller_then_handler() {
    let trail = Arc::new(Mutex::new(Vec::new()));
    let calls = Arc::new(AtomicUsize::new(0));

    let stack = CallStack::new(counting_handler(Arc::clone(&calls)))
        .with_arc(recording("controller", Arc::clone(&trail)))
        .preceded_by([recording("global", Arc::clone(&trail))]);

    let response = stack.run(items_request(), Response::new()).await.unwrap();

    assert_eq!(*trail.lock().unwrap(), vec!["global", "controller"]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body().as_json(), Some(&json!({"id": "7"})));
}

#[tokio::test]
async fn test_debug_log_in_chain() {
    let calls = Arc::new(AtomicUsize::new(0));
    let stack = CallStack::new(counting_handler(Arc::clone(&calls))).with(DebugLog::new());

    let response = stack.run(items_request(), Response::new()).await.unwrap();
    assert_eq!(response.body().as_json(), Some(&json!({"id": "7"})));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Short-circuit and failure
// ============================================================================

#[tokio::test]
async fn test_failing_stage_never_reaches_handler() {
    let calls = Arc::new(AtomicUsize::new(0));
    let stack = CallStack::new(counting_handler(Arc::clone(&calls))).with(middleware_fn(
        "deny",
        |_request, _response| async move { Err(RouteError::from("denied")) },
    ));

    let err = stack
        .run(items_request(), Response::new())
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    let reply = err.into_response();
    assert_eq!(reply.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.body().as_text(), Some("denied"));
}

#[tokio::test]
async fn test_halting_stage_replies_directly() {
    let calls = Arc::new(AtomicUsize::new(0));
    let trail = Arc::new(Mutex::new(Vec::new()));
    let stack = CallStack::new(counting_handler(Arc::clone(&calls)))
        .with(middleware_fn("maintenance", |_request, response: Response| async move {
            Ok(Flow::Halt(
                response
                    .with_status(StatusCode::SERVICE_UNAVAILABLE)
                    .with_body("down for maintenance"),
            ))
        }))
        .with_arc(recording("after", Arc::clone(&trail)));

    let response = stack.run(items_request(), Response::new()).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(trail.lock().unwrap().is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_handler_error_status_is_kept() {
    let stack = CallStack::new(handler_fn(|_request, _response| async move {
        Err(RouteError::with_status(StatusCode::NOT_FOUND, json!({"error": "no such item"})))
    }));

    let reply = stack
        .run(items_request(), Response::new())
        .await
        .unwrap_err()
        .into_response();

    assert_eq!(reply.status(), StatusCode::NOT_FOUND);
    assert_eq!(reply.body().as_json(), Some(&json!({"error": "no such item"})));
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_are_isolated() {
    let handler = CallStack::new(handler_fn(|request, response| async move {
        tokio::task::yield_now().await;
        Ok(response.with_body(request.param("id").unwrap_or_default().to_string()))
    }))
    .into_handler();

    let mut tasks = Vec::new();
    for i in 0..32 {
        let handler = Arc::clone(&handler);
        tasks.push(tokio::spawn(async move {
            let request = Request::new(Method::GET, "/items").with_param("id", i.to_string());
            (i, handler(request, Response::new()).await)
        }));
    }

    for task in tasks {
        let (i, response) = task.await.unwrap();
        assert_eq!(response.unwrap().body().as_text(), Some(i.to_string().as_str()));
    }
}
