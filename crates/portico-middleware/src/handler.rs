//! Route handlers.
//!
//! A handler is the terminal stage of a call stack. It receives the
//! request and the response built by the middleware before it, and returns
//! the final response.

use std::fmt;
use std::future::Future;

use portico_core::{Request, Response, RouteResult};

use crate::middleware::BoxFuture;

/// The terminal stage of a call stack.
pub trait Handler: Send + Sync + 'static {
    /// Produces the final response.
    fn call(&self, request: Request, response: Response) -> BoxFuture<'_, RouteResult>;
}

/// A handler created from an async function.
///
/// # Example
///
/// ```
/// use portico_middleware::handler_fn;
/// use serde_json::json;
///
/// let get_item = handler_fn(|request, response| async move {
///     let id = request.param("id").unwrap_or_default().to_string();
///     Ok(response.with_body(json!({ "id": id })))
/// });
/// ```
pub struct FnHandler<F> {
    func: F,
}

impl<F> FnHandler<F> {
    /// Creates a new function-based handler.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Request, Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RouteResult> + Send + 'static,
{
    fn call(&self, request: Request, response: Response) -> BoxFuture<'_, RouteResult> {
        Box::pin((self.func)(request, response))
    }
}

/// Creates an [`FnHandler`], pinning the closure's signature so its
/// argument and error types are inferred.
pub fn handler_fn<F, Fut>(func: F) -> FnHandler<F>
where
    F: Fn(Request, Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RouteResult> + Send + 'static,
{
    FnHandler::new(func)
}
