//! Sequential composition of middleware and a handler.
//!
//! A [`CallStack`] is the composed chain for one route: global middleware,
//! then controller middleware, then the route handler. Each stage is
//! awaited before the next one starts, and each receives the request and
//! response the previous stage handed on.
//!
//! ```text
//! (Request, Response) → stage 1 → stage 2 → … → handler → Response
//!                          │          │
//!                        Halt       Err ──→ RouteError (chain aborted)
//!                          ↓
//!                       Response
//! ```

use std::fmt;
use std::sync::Arc;

use portico_core::{Request, Response, RouteResult};

use crate::handler::Handler;
use crate::middleware::{BoxFuture, Flow, Middleware};

/// A composed call stack, invoked once per request.
///
/// This is the shape engines call: it owns everything it needs, so the
/// returned future can be spawned.
pub type CallStackHandler =
    Arc<dyn Fn(Request, Response) -> BoxFuture<'static, RouteResult> + Send + Sync>;

/// An ordered chain of middleware ending in a handler.
///
/// # Example
///
/// ```
/// use portico_core::{Request, Response};
/// use portico_middleware::{handler_fn, middleware_fn, CallStack, Flow};
///
/// # tokio_test::block_on(async {
/// let stack = CallStack::new(handler_fn(|request, response| async move {
///     Ok(response.with_body(request.header("x-user").unwrap_or("anonymous").to_string()))
/// }))
/// .with(middleware_fn("auth", |request, response| async move {
///     Ok(Flow::Next(request.with_header("x-user", "alice"), response))
/// }));
///
/// let response = stack
///     .run(Request::new(http::Method::GET, "/"), Response::new())
///     .await
///     .unwrap();
/// assert_eq!(response.body().as_text(), Some("alice"));
/// # });
/// ```
#[derive(Clone)]
pub struct CallStack {
    stages: Vec<Arc<dyn Middleware>>,
    handler: Arc<dyn Handler>,
}

impl CallStack {
    /// Creates a call stack with no middleware.
    pub fn new(handler: impl Handler) -> Self {
        Self::from_arc(Arc::new(handler))
    }

    /// Creates a call stack from a shared handler.
    pub fn from_arc(handler: Arc<dyn Handler>) -> Self {
        Self {
            stages: Vec::new(),
            handler,
        }
    }

    /// Appends a middleware stage; it runs after those already added.
    #[must_use]
    pub fn with(self, middleware: impl Middleware) -> Self {
        self.with_arc(Arc::new(middleware))
    }

    /// Appends a shared middleware stage.
    #[must_use]
    pub fn with_arc(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.stages.push(middleware);
        self
    }

    /// Prepends shared middleware stages; they run before those already
    /// added, in the order given.
    #[must_use]
    pub fn preceded_by<I>(mut self, middleware: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Middleware>>,
    {
        let mut stages: Vec<_> = middleware.into_iter().collect();
        stages.append(&mut self.stages);
        self.stages = stages;
        self
    }

    /// Returns the middleware stages in execution order.
    #[must_use]
    pub fn stages(&self) -> &[Arc<dyn Middleware>] {
        &self.stages
    }

    /// Returns the stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Runs the chain.
    ///
    /// Stops at the first stage that halts or fails. The handler only runs
    /// if every stage continued.
    pub async fn run(&self, mut request: Request, mut response: Response) -> RouteResult {
        for stage in &self.stages {
            match stage.process(request, response).await {
                Ok(Flow::Next(next_request, next_response)) => {
                    request = next_request;
                    response = next_response;
                }
                Ok(Flow::Halt(response)) => {
                    tracing::trace!(stage = stage.name(), "call stack halted");
                    return Ok(response);
                }
                Err(err) => {
                    tracing::trace!(stage = stage.name(), error = %err, "call stack aborted");
                    return Err(err);
                }
            }
        }

        self.handler.call(request, response).await
    }

    /// Wraps the chain into a [`CallStackHandler`].
    #[must_use]
    pub fn into_handler(self) -> CallStackHandler {
        let stack = Arc::new(self);
        Arc::new(move |request: Request, response: Response| -> BoxFuture<'static, RouteResult> {
            let stack = Arc::clone(&stack);
            Box::pin(async move { stack.run(request, response).await })
        })
    }
}

impl fmt::Debug for CallStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallStack")
            .field("stages", &self.stage_names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use crate::middleware::middleware_fn;
    use http::{Method, StatusCode};
    use portico_core::RouteError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn echo_handler() -> impl Handler {
        handler_fn(|_request, response| async move { Ok(response.with_body("handled")) })
    }

    fn request() -> Request {
        Request::new(Method::GET, "/items/7")
    }

    #[tokio::test]
    async fn test_handler_only() {
        let stack = CallStack::new(echo_handler());
        let response = stack.run(request(), Response::new()).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_text(), Some("handled"));
    }

    #[tokio::test]
    async fn test_stages_run_in_order() {
        let stack = CallStack::new(handler_fn(|_request, response: Response| async move {
            let trail = response.header("x-trail").unwrap_or_default().to_string();
            Ok(response.with_body(trail))
        }))
        .with(middleware_fn("one", |request, response| async move {
            Ok(Flow::Next(request, response.with_header("x-trail", "1")))
        }))
        .with(middleware_fn("two", |request, response: Response| async move {
            let trail = format!("{},2", response.header("x-trail").unwrap_or_default());
            Ok(Flow::Next(request, response.with_header("x-trail", trail)))
        }));

        assert_eq!(stack.stage_names(), vec!["one", "two"]);
        let response = stack.run(request(), Response::new()).await.unwrap();
        assert_eq!(response.body().as_text(), Some("1,2"));
    }

    #[tokio::test]
    async fn test_async_stage_completes_before_next() {
        let stack = CallStack::new(handler_fn(|request: Request, response| async move {
            Ok(response.with_body(request.header("x-auth").unwrap_or("missing").to_string()))
        }))
        .with(middleware_fn("slow_auth", |request, response| async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            Ok(Flow::Next(request.with_header("x-auth", "ok"), response))
        }));

        let response = stack.run(request(), Response::new()).await.unwrap();
        assert_eq!(response.body().as_text(), Some("ok"));
    }

    #[tokio::test]
    async fn test_halt_skips_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let stack = CallStack::new(handler_fn(move |_request, response| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(response)
            }
        }))
        .with(middleware_fn("cache", |_request, response: Response| async move {
            Ok(Flow::Halt(
                response.with_status(StatusCode::NOT_MODIFIED),
            ))
        }));

        let response = stack.run(request(), Response::new()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_error_aborts_chain() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let stack = CallStack::new(echo_handler())
            .with(middleware_fn("deny", |_request, _response| async move {
                Err(RouteError::from("denied"))
            }))
            .with(middleware_fn("after", move |request, response| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Flow::Next(request, response))
                }
            }));

        let err = stack.run(request(), Response::new()).await.unwrap_err();
        assert_eq!(err, RouteError::from("denied"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_preceded_by() {
        let global: Arc<dyn Middleware> = Arc::new(middleware_fn(
            "global",
            |request, response| async move { Ok(Flow::Next(request, response)) },
        ));
        let stack = CallStack::new(echo_handler())
            .with(middleware_fn("route", |request, response| async move {
                Ok(Flow::Next(request, response))
            }))
            .preceded_by([global]);

        assert_eq!(stack.stage_names(), vec!["global", "route"]);
    }

    #[tokio::test]
    async fn test_into_handler() {
        let handler = CallStack::new(echo_handler()).into_handler();

        let first = handler(request(), Response::new()).await.unwrap();
        let second = handler(request(), Response::new()).await.unwrap();
        assert_eq!(first, second);
    }
}
