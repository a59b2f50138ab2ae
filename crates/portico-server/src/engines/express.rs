//! Express-style engine.
//!
//! Native handlers receive the request and a continuation-style
//! [`ExpressReply`]: they set a status, add headers and finally `send` a
//! body. Routes are matched by a radix tree keyed on the canonical `:param`
//! syntax, so no path translation is needed. A trailing `*name` catch-all
//! is supported; optional segments are not.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderName, HeaderValue, Method, StatusCode};
use parking_lot::RwLock;
use portico_core::{Request, Response, TEXT_CONTENT_TYPE};
use portico_middleware::BoxFuture;
use portico_router::{Capabilities, Params, PathPattern, Router};

use crate::config::ServerConfig;
use crate::engine::{Engine, HttpServer};
use crate::error::ServerError;
use crate::route::RouteConfig;

/// A request as native Express handlers see it.
#[derive(Debug)]
pub struct ExpressRequest {
    /// The request head.
    pub parts: http::request::Parts,
    /// Path parameters in declaration order, already decoded.
    pub params: Params,
    /// The raw body.
    pub body: Bytes,
}

/// The continuation a native handler replies through.
///
/// Nothing reaches the client until [`send`](ExpressReply::send) is called.
/// A reply that was never sent becomes a `500`.
#[derive(Debug)]
pub struct ExpressReply {
    status: StatusCode,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Option<Bytes>,
}

impl ExpressReply {
    fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Sets the status code.
    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    /// Returns the status code set so far.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Appends a header. Headers are emitted in the order they were set.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) -> &mut Self {
        self.headers.push((name, value));
        self
    }

    /// Writes the body and completes the reply. Later calls are ignored.
    pub fn send(&mut self, body: impl Into<Bytes>) {
        if self.body.is_some() {
            tracing::warn!("reply already sent, ignoring second send");
            return;
        }
        self.body = Some(body.into());
    }

    /// Returns true once the body has been sent.
    #[must_use]
    pub fn is_sent(&self) -> bool {
        self.body.is_some()
    }

    /// Emits a normalized response: status, then headers in order, then
    /// the body.
    fn send_response(&mut self, response: Response) {
        let (parts, body) = response.into_http().into_parts();
        self.status(parts.status);
        for (name, value) in &parts.headers {
            self.set_header(name.clone(), value.clone());
        }
        self.send(body);
    }

    fn finish(self) -> http::Response<Bytes> {
        let Some(body) = self.body else {
            tracing::warn!("handler completed without sending a reply");
            let mut native = http::Response::new(Bytes::new());
            *native.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            return native;
        };

        let mut native = http::Response::new(body);
        *native.status_mut() = self.status;
        let headers = native.headers_mut();
        for (name, value) in self.headers {
            headers.append(name, value);
        }
        native
    }
}

/// A native route handler.
pub type NativeHandler =
    Arc<dyn Fn(ExpressRequest, ExpressReply) -> BoxFuture<'static, ExpressReply> + Send + Sync>;

/// The native Express-style application.
///
/// Cloning is cheap; clones share one routing table.
#[derive(Clone, Default)]
pub struct ExpressApp {
    router: Arc<RwLock<Router<NativeHandler>>>,
}

impl ExpressApp {
    /// Creates an application with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a native handler directly, bypassing the route table.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is invalid or already bound for
    /// `method`.
    pub fn route<F, Fut>(&self, method: Method, path: &str, handler: F) -> Result<(), ServerError>
    where
        F: Fn(ExpressRequest, ExpressReply) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ExpressReply> + Send + 'static,
    {
        let handler: NativeHandler = Arc::new(move |request: ExpressRequest, reply: ExpressReply| {
            Box::pin(handler(request, reply)) as BoxFuture<'static, ExpressReply>
        });
        let pattern = PathPattern::parse(path)
            .map_err(|source| ServerError::from_router(&method, path, source))?;
        self.bind(method, &pattern, handler)
    }

    fn bind(&self, method: Method, pattern: &PathPattern, handler: NativeHandler) -> Result<(), ServerError> {
        Capabilities::WITH_CATCH_ALL
            .check(pattern)
            .and_then(|()| self.router.write().insert(method.clone(), pattern, handler))
            .map_err(|source| ServerError::from_router(&method, pattern.as_str(), source))
    }

    /// Returns the number of bound routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.router.read().len()
    }

    /// Serves one native request.
    pub async fn handle(&self, request: http::Request<Bytes>) -> http::Response<Bytes> {
        let (parts, body) = request.into_parts();

        let matched = {
            let router = self.router.read();
            router
                .match_route(&parts.method, parts.uri.path())
                .map(|m| (Arc::clone(m.value), m.params))
        };

        let Some((handler, params)) = matched else {
            tracing::debug!(method = %parts.method, path = parts.uri.path(), "no route matched");
            return not_found(&parts.method, parts.uri.path());
        };

        let request = ExpressRequest { parts, params, body };
        handler(request, ExpressReply::new()).await.finish()
    }
}

impl fmt::Debug for ExpressApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpressApp")
            .field("routes", &self.route_count())
            .finish()
    }
}

fn not_found(method: &Method, path: &str) -> http::Response<Bytes> {
    let mut native = http::Response::new(Bytes::from(format!("Cannot {method} {path}")));
    *native.status_mut() = StatusCode::NOT_FOUND;
    native
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_CONTENT_TYPE));
    native
}

/// Wraps a route's call stack in the native handler signature.
fn native_handler(route: Arc<RouteConfig>) -> NativeHandler {
    Arc::new(move |native: ExpressRequest, mut reply: ExpressReply| -> BoxFuture<'static, ExpressReply> {
        let route = Arc::clone(&route);
        Box::pin(async move {
            let request = Request::from_parts(native.parts, native.params, native.body);
            match route.invoke(request).await {
                Ok(response) => {
                    tracing::debug!(
                        route = route.method_name(),
                        status = response.status().as_u16(),
                        "sending response"
                    );
                    reply.send_response(response);
                }
                Err(err) => {
                    tracing::warn!(route = route.method_name(), error = %err, "handler chain failed");
                    // The reply is untouched here, so the error decides the status.
                    reply.send_response(err.into_response());
                }
            }
            reply
        })
    })
}

/// The Express-style engine adapter.
#[derive(Debug, Default)]
pub struct ExpressEngine {
    app: Option<ExpressApp>,
}

impl ExpressEngine {
    /// Creates an engine that has not been initialized.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Engine for ExpressEngine {
    type Native = ExpressApp;

    const NAME: &'static str = "express";

    fn capabilities(&self) -> Capabilities {
        Capabilities::WITH_CATCH_ALL
    }

    fn initialize(&mut self, _config: &ServerConfig) -> Result<HttpServer, ServerError> {
        let app = ExpressApp::new();
        let service_app = app.clone();
        self.app = Some(app);

        Ok(HttpServer::new(Self::NAME, move |request| {
            let app = service_app.clone();
            async move { app.handle(request).await }
        }))
    }

    fn register_route_with_engine(&mut self, route: Arc<RouteConfig>) -> Result<(), ServerError> {
        let app = self.app.as_ref().ok_or(ServerError::NotInitialized { engine: Self::NAME })?;
        let method = route.method().clone();
        let pattern = route.pattern().clone();
        app.bind(method, &pattern, native_handler(route))
    }

    fn native(&self) -> Option<&ExpressApp> {
        self.app.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portico_middleware::handler_fn;

    fn get(uri: &str) -> http::Request<Bytes> {
        http::Request::builder().uri(uri).body(Bytes::new()).unwrap()
    }

    fn initialized() -> (ExpressEngine, HttpServer) {
        let mut engine = ExpressEngine::new();
        let server = engine.initialize(&ServerConfig::default()).unwrap();
        (engine, server)
    }

    #[test]
    fn test_register_before_initialize() {
        let mut engine = ExpressEngine::new();
        let route = RouteConfig::builder(
            Method::GET,
            "/",
            handler_fn(|_request, response| async move { Ok(response) }),
        )
        .build()
        .unwrap();

        let err = engine.register_route_with_engine(Arc::new(route)).unwrap_err();
        assert!(matches!(err, ServerError::NotInitialized { engine: "express" }));
    }

    #[tokio::test]
    async fn test_unmatched_path_is_404() {
        let (_engine, server) = initialized();
        let response = server.dispatch(get("/missing")).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.body(), &Bytes::from_static(b"Cannot GET /missing"));
    }

    #[tokio::test]
    async fn test_catch_all_route() {
        let (mut engine, server) = initialized();
        let route = RouteConfig::builder(
            Method::GET,
            "/files/*path",
            handler_fn(|request: Request, response: Response| async move {
                Ok(response.with_body(request.param("path").unwrap_or_default().to_string()))
            }),
        )
        .build()
        .unwrap();
        engine.register_route_with_engine(Arc::new(route)).unwrap();

        let response = server.dispatch(get("/files/a/b.txt")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), &Bytes::from_static(b"a/b.txt"));
    }

    #[tokio::test]
    async fn test_panicking_handler_gets_error_reply() {
        let (mut engine, server) = initialized();
        let route = RouteConfig::builder(
            Method::GET,
            "/boom",
            handler_fn(|_request, _response| async move {
                if true {
                    panic!("boom");
                }
                Ok(Response::new())
            }),
        )
        .build()
        .unwrap();
        engine.register_route_with_engine(Arc::new(route)).unwrap();

        let response = tokio::spawn(async move { server.dispatch(get("/boom")).await })
            .await
            .expect("dispatch task should not panic");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body(), &Bytes::from_static(b"boom"));
    }

    #[tokio::test]
    async fn test_native_handler_that_never_sends() {
        let (engine, server) = initialized();
        engine
            .native()
            .unwrap()
            .route(Method::GET, "/silent", |_request, reply| async move { reply })
            .unwrap();

        let response = server.dispatch(get("/silent")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_native_reply_headers_in_order() {
        let (engine, server) = initialized();
        engine
            .native()
            .unwrap()
            .route(Method::GET, "/raw", |_request, mut reply| async move {
                reply
                    .status(StatusCode::ACCEPTED)
                    .set_header(HeaderName::from_static("x-b"), HeaderValue::from_static("2"))
                    .set_header(HeaderName::from_static("x-a"), HeaderValue::from_static("1"));
                reply.send("raw");
                reply
            })
            .unwrap();

        let response = server.dispatch(get("/raw")).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let names: Vec<_> = response.headers().keys().map(HeaderName::as_str).collect();
        assert_eq!(names, vec!["x-b", "x-a"]);
    }

    #[test]
    fn test_optional_segment_rejected() {
        let app = ExpressApp::new();
        let err = app
            .route(Method::GET, "/users/:id?", |_request, reply| async move { reply })
            .unwrap_err();
        assert!(matches!(err, ServerError::Registration { .. }));
        assert_eq!(app.route_count(), 0);
    }
}
