//! Hapi-style engine backed by an [`axum::Router`].
//!
//! Routes are rewritten to brace syntax (`/users/{id}`) when they are
//! bound. The native router cannot express catch-all or optional segments
//! in canonical form, so those are rejected at registration.
//!
//! Handlers are return-value driven: the native closure returns the reply
//! instead of writing to a continuation.

use std::fmt;
use std::mem;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{FromRequestParts, RawPathParams};
use axum::routing::{on, MethodFilter};
use bytes::Bytes;
use http::StatusCode;
use parking_lot::RwLock;
use portico_core::Request;
use portico_router::{Capabilities, Params, Router as ShadowRouter, RouterError};
use tower::ServiceExt;

use crate::config::ServerConfig;
use crate::engine::{Engine, HttpServer};
use crate::error::ServerError;
use crate::route::RouteConfig;

/// The native Hapi-style application.
///
/// Cloning is cheap; clones share one router.
#[derive(Clone, Default)]
pub struct HapiApp {
    router: Arc<RwLock<axum::Router>>,
    // Mirrors every binding so conflicts surface as errors; axum panics on
    // them.
    bindings: Arc<RwLock<ShadowRouter<()>>>,
}

impl HapiApp {
    /// Creates an application with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `f` to the native router.
    ///
    /// Routes added here are invisible to the route table and to conflict
    /// detection.
    pub fn map_router<F>(&self, f: F)
    where
        F: FnOnce(axum::Router) -> axum::Router,
    {
        let mut router = self.router.write();
        *router = f(mem::take(&mut *router));
    }

    /// Returns the number of routes bound through the engine.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.bindings.read().len()
    }

    /// Serves one native request.
    pub async fn handle(&self, request: http::Request<Bytes>) -> http::Response<Bytes> {
        let router = self.router.read().clone();
        let response = match router.oneshot(request.map(Body::from)).await {
            Ok(response) => response,
            Err(never) => match never {},
        };

        let (parts, body) = response.into_parts();
        match axum::body::to_bytes(body, usize::MAX).await {
            Ok(bytes) => http::Response::from_parts(parts, bytes),
            Err(err) => {
                tracing::error!(error = %err, "failed to read response body");
                let mut native = http::Response::new(Bytes::new());
                *native.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                native
            }
        }
    }

    fn bind(&self, route: Arc<RouteConfig>) -> Result<(), ServerError> {
        let method = route.method().clone();
        let reject = |source: RouterError| ServerError::from_router(&method, route.path(), source);

        let native_path = route.pattern().to_brace_syntax().map_err(reject)?;
        let filter = MethodFilter::try_from(method.clone()).map_err(|_| {
            reject(RouterError::Unsupported {
                pattern: route.path().to_string(),
                reason: "extension methods are not supported by this engine",
            })
        })?;

        self.bindings
            .write()
            .insert(method.clone(), route.pattern(), ())
            .map_err(reject)?;

        tracing::debug!(path = route.path(), %native_path, "translated route path");

        let handler_route = Arc::clone(&route);
        let handler = move |request: axum::extract::Request| {
            let route = Arc::clone(&handler_route);
            async move { serve(&route, request).await }
        };

        let mut router = self.router.write();
        *router = mem::take(&mut *router).route(&native_path, on(filter, handler));
        Ok(())
    }
}

impl fmt::Debug for HapiApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HapiApp")
            .field("routes", &self.route_count())
            .finish_non_exhaustive()
    }
}

/// Translates the native request, runs the call stack and translates the
/// result back.
async fn serve(route: &RouteConfig, request: axum::extract::Request) -> axum::response::Response {
    let (mut parts, body) = request.into_parts();

    let mut params = Params::with_capacity(route.pattern().segments().len());
    // Values arrive percent-decoded.
    if let Ok(raw) = RawPathParams::from_request_parts(&mut parts, &()).await {
        for (name, value) in raw.iter() {
            params.push(name, value);
        }
    }

    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(route = route.method_name(), error = %err, "failed to read request body");
            let mut native = axum::response::Response::new(Body::from("failed to read request body"));
            *native.status_mut() = StatusCode::BAD_REQUEST;
            return native;
        }
    };

    let response = match route.invoke(Request::from_parts(parts, params, body)).await {
        Ok(response) => {
            tracing::debug!(
                route = route.method_name(),
                status = response.status().as_u16(),
                "sending response"
            );
            response
        }
        Err(err) => {
            tracing::warn!(route = route.method_name(), error = %err, "handler chain failed");
            err.into_response()
        }
    };

    response.into_http().map(Body::from)
}

/// The Hapi-style engine adapter.
#[derive(Debug, Default)]
pub struct HapiEngine {
    app: Option<HapiApp>,
}

impl HapiEngine {
    /// Creates an engine that has not been initialized.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Engine for HapiEngine {
    type Native = HapiApp;

    const NAME: &'static str = "hapi";

    fn capabilities(&self) -> Capabilities {
        Capabilities::PARAMS_ONLY
    }

    fn initialize(&mut self, _config: &ServerConfig) -> Result<HttpServer, ServerError> {
        let app = HapiApp::new();
        let service_app = app.clone();
        self.app = Some(app);

        Ok(HttpServer::new(Self::NAME, move |request| {
            let app = service_app.clone();
            async move { app.handle(request).await }
        }))
    }

    fn register_route_with_engine(&mut self, route: Arc<RouteConfig>) -> Result<(), ServerError> {
        self.app
            .as_ref()
            .ok_or(ServerError::NotInitialized { engine: Self::NAME })?
            .bind(route)
    }

    fn native(&self) -> Option<&HapiApp> {
        self.app.as_ref()
    }
}
