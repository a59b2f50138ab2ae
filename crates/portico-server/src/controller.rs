//! Controller registration.
//!
//! How controllers are discovered is up to the caller. A [`Controller`]
//! only has to say where it is mounted, which middleware it adds, and
//! which routes it declares; [`Server::register_controller`] composes
//! them into route configurations.
//!
//! [`Server::register_controller`]: crate::Server::register_controller

use std::fmt;
use std::sync::Arc;

use http::Method;
use portico_middleware::{Handler, Middleware};

/// A route declared by a controller, before composition.
#[derive(Clone)]
pub struct RouteDeclaration {
    method: Method,
    path: String,
    method_name: String,
    middleware: Vec<Arc<dyn Middleware>>,
    handler: Arc<dyn Handler>,
}

impl RouteDeclaration {
    /// Declares a route relative to the controller's base path.
    pub fn new(
        method: Method,
        path: impl Into<String>,
        method_name: impl Into<String>,
        handler: impl Handler,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            method_name: method_name.into(),
            middleware: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    /// Declares a `GET` route.
    pub fn get(path: impl Into<String>, method_name: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::GET, path, method_name, handler)
    }

    /// Declares a `POST` route.
    pub fn post(path: impl Into<String>, method_name: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::POST, path, method_name, handler)
    }

    /// Declares a `PUT` route.
    pub fn put(path: impl Into<String>, method_name: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::PUT, path, method_name, handler)
    }

    /// Declares a `DELETE` route.
    pub fn delete(path: impl Into<String>, method_name: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::DELETE, path, method_name, handler)
    }

    /// Adds middleware that runs after controller middleware, just before
    /// the handler.
    #[must_use]
    pub fn with_middleware(mut self, middleware: impl Middleware) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Returns the method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the path relative to the controller.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the name used in logs.
    #[must_use]
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    /// Returns the route-level middleware.
    #[must_use]
    pub fn middleware(&self) -> &[Arc<dyn Middleware>] {
        &self.middleware
    }

    /// Returns the handler.
    #[must_use]
    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }
}

impl fmt::Debug for RouteDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDeclaration")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("method_name", &self.method_name)
            .field(
                "middleware",
                &self.middleware.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

/// A group of routes sharing a base path and middleware.
pub trait Controller: Send + Sync {
    /// Path every route is mounted under.
    fn base_path(&self) -> &str {
        "/"
    }

    /// Middleware run for every route, after global middleware.
    fn middleware(&self) -> Vec<Arc<dyn Middleware>> {
        Vec::new()
    }

    /// The routes, in the order they should be registered.
    fn routes(&self) -> Vec<RouteDeclaration>;
}

/// Joins a base path and a route path with exactly one `/` between them.
pub(crate) fn join_paths(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    match (base.is_empty(), path.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{path}"),
        (false, true) => {
            if base.starts_with('/') {
                base.to_string()
            } else {
                format!("/{base}")
            }
        }
        (false, false) => {
            if base.starts_with('/') {
                format!("{base}/{path}")
            } else {
                format!("/{base}/{path}")
            }
        }
    }
}
