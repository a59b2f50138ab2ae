//! Route configuration.
//!
//! A [`RouteConfig`] is one entry of the route table: a canonical path, a
//! method, a name for logs, and the composed call stack that serves it.
//! It is built once during bootstrap and never changes after that.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use http::{Method, StatusCode};
use portico_core::{Request, Response, RouteError, RouteResult};
use portico_middleware::{CallStack, CallStackHandler, Handler, Middleware};
use portico_router::PathPattern;

use crate::error::ServerError;

/// Returns the response every call stack starts from: `200 OK`, no
/// headers, no body.
#[must_use]
pub fn default_response() -> Response {
    Response::new()
}

/// One registered route.
///
/// # Example
///
/// ```rust
/// use http::Method;
/// use portico_middleware::handler_fn;
/// use portico_server::RouteConfig;
///
/// let route = RouteConfig::builder(
///     Method::GET,
///     "/items/:id",
///     handler_fn(|request, response| async move {
///         Ok(response.with_body(request.param("id").unwrap_or_default().to_string()))
///     }),
/// )
/// .method_name("getItem")
/// .build()
/// .unwrap();
///
/// assert_eq!(route.path(), "/items/:id");
/// assert_eq!(route.method_name(), "getItem");
/// ```
#[derive(Clone)]
pub struct RouteConfig {
    path: String,
    pattern: PathPattern,
    method: Method,
    method_name: String,
    call_stack: CallStack,
    call_stack_handler: CallStackHandler,
}

impl RouteConfig {
    /// Creates a route from an already composed call stack.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Registration`] if `path` is not a valid
    /// canonical pattern.
    pub fn new(
        method: Method,
        path: &str,
        method_name: impl Into<String>,
        call_stack: CallStack,
    ) -> Result<Self, ServerError> {
        let pattern = PathPattern::parse(path)
            .map_err(|source| ServerError::from_router(&method, path, source))?;
        let call_stack_handler = call_stack.clone().into_handler();

        Ok(Self {
            path: path.to_string(),
            pattern,
            method,
            method_name: method_name.into(),
            call_stack,
            call_stack_handler,
        })
    }

    /// Starts building a route that ends in `handler`.
    pub fn builder(method: Method, path: impl Into<String>, handler: impl Handler) -> RouteConfigBuilder {
        RouteConfigBuilder {
            method,
            path: path.into(),
            method_name: None,
            call_stack: CallStack::new(handler),
        }
    }

    /// Returns the canonical path as declared.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the parsed path pattern.
    #[must_use]
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the name used in logs.
    #[must_use]
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    /// Returns the middleware and handler chain.
    #[must_use]
    pub fn call_stack(&self) -> &CallStack {
        &self.call_stack
    }

    /// Returns the composed call stack.
    #[must_use]
    pub fn call_stack_handler(&self) -> &CallStackHandler {
        &self.call_stack_handler
    }

    /// Runs the call stack, seeded with [`default_response`].
    ///
    /// A stage that panics fails the chain with a `500` [`RouteError`]
    /// carrying the panic message, like any other stage error.
    pub async fn invoke(&self, request: Request) -> RouteResult {
        let chain = (self.call_stack_handler)(request, default_response());
        match AssertUnwindSafe(chain).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(route = %self.method_name, panic = %message, "call stack panicked");
                Err(RouteError::with_status(StatusCode::INTERNAL_SERVER_ERROR, message))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "handler panicked".to_string())
}

impl fmt::Debug for RouteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteConfig")
            .field("path", &self.path)
            .field("method", &self.method)
            .field("method_name", &self.method_name)
            .field("call_stack", &self.call_stack)
            .finish_non_exhaustive()
    }
}

/// Builder for [`RouteConfig`].
pub struct RouteConfigBuilder {
    method: Method,
    path: String,
    method_name: Option<String>,
    call_stack: CallStack,
}

impl RouteConfigBuilder {
    /// Sets the name used in logs. Defaults to `"<METHOD> <path>"`.
    #[must_use]
    pub fn method_name(mut self, name: impl Into<String>) -> Self {
        self.method_name = Some(name.into());
        self
    }

    /// Appends a middleware stage.
    #[must_use]
    pub fn middleware(mut self, middleware: impl Middleware) -> Self {
        self.call_stack = self.call_stack.with(middleware);
        self
    }

    /// Appends a shared middleware stage.
    #[must_use]
    pub fn middleware_arc(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.call_stack = self.call_stack.with_arc(middleware);
        self
    }

    /// Builds the route.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Registration`] if the path is not a valid
    /// canonical pattern.
    pub fn build(self) -> Result<RouteConfig, ServerError> {
        let method_name = self
            .method_name
            .unwrap_or_else(|| format!("{} {}", self.method, self.path));
        RouteConfig::new(self.method, &self.path, method_name, self.call_stack)
    }
}
