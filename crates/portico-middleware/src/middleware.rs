//! Core middleware trait and types.
//!
//! A middleware stage receives the request and the response produced so
//! far, and returns a [`Flow`] that says whether the chain continues.
//! Stopping and continuing are both plain return values: a stage that
//! wants downstream stages to run returns [`Flow::Next`], a stage that
//! answers on its own returns [`Flow::Halt`].
//!
//! # Example
//!
//! ```
//! use portico_core::{Request, Response, RouteResult};
//! use portico_middleware::{BoxFuture, Flow, Middleware};
//!
//! struct RequireApiKey;
//!
//! impl Middleware for RequireApiKey {
//!     fn name(&self) -> &'static str {
//!         "require_api_key"
//!     }
//!
//!     fn process(&self, request: Request, response: Response) -> BoxFuture<'_, RouteResult<Flow>> {
//!         Box::pin(async move {
//!             if request.header("x-api-key").is_none() {
//!                 return Ok(Flow::Halt(
//!                     response.with_status(http::StatusCode::UNAUTHORIZED),
//!                 ));
//!             }
//!             Ok(Flow::Next(request, response))
//!         })
//!     }
//! }
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use portico_core::{Request, Response, RouteResult};

/// A boxed future, as returned by middleware stages and handlers.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a middleware stage decided.
#[derive(Debug)]
pub enum Flow {
    /// Run the next stage with this request and response.
    Next(Request, Response),
    /// Stop the chain and reply with this response.
    Halt(Response),
}

impl Flow {
    /// Returns the response carried by either variant.
    #[must_use]
    pub fn into_response(self) -> Response {
        match self {
            Self::Next(_, response) | Self::Halt(response) => response,
        }
    }

    /// Returns true if the chain stops here.
    #[must_use]
    pub fn is_halt(&self) -> bool {
        matches!(self, Self::Halt(_))
    }
}

/// The core middleware trait.
///
/// # Invariants
///
/// - A stage runs only after the previous stage's future has completed
/// - Returning `Err` aborts the chain; no later stage or handler runs
/// - Returning [`Flow::Halt`] skips later stages and the handler
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this stage, used in logs.
    fn name(&self) -> &'static str;

    /// Processes one request.
    fn process(&self, request: Request, response: Response) -> BoxFuture<'_, RouteResult<Flow>>;
}

/// A middleware that can be created from an async function.
///
/// # Example
///
/// ```
/// use portico_middleware::{middleware_fn, Flow};
///
/// let tag = middleware_fn("tag", |request, response| async move {
///     Ok(Flow::Next(request, response.with_header("x-tagged", "1")))
/// });
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F> {
    /// Creates a new function-based middleware.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> fmt::Debug for FnMiddleware<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMiddleware")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<F, Fut> Middleware for FnMiddleware<F>
where
    F: Fn(Request, Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RouteResult<Flow>> + Send + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process(&self, request: Request, response: Response) -> BoxFuture<'_, RouteResult<Flow>> {
        Box::pin((self.func)(request, response))
    }
}

/// Creates an [`FnMiddleware`], pinning the closure's signature so its
/// argument and error types are inferred.
pub fn middleware_fn<F, Fut>(name: &'static str, func: F) -> FnMiddleware<F>
where
    F: Fn(Request, Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RouteResult<Flow>> + Send + 'static,
{
    FnMiddleware::new(name, func)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, StatusCode};
    use portico_core::RouteError;

    struct Tagging {
        name: &'static str,
    }

    impl Middleware for Tagging {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process(
            &self,
            request: Request,
            response: Response,
        ) -> BoxFuture<'_, RouteResult<Flow>> {
            Box::pin(async move {
                let response = response.with_header(self.name, "visited");
                Ok(Flow::Next(request, response))
            })
        }
    }

    #[tokio::test]
    async fn test_middleware_name() {
        let mw = Tagging { name: "test" };
        assert_eq!(mw.name(), "test");
    }

    #[tokio::test]
    async fn test_trait_impl_continues() {
        let mw = Tagging { name: "x-first" };
        let flow = mw
            .process(Request::new(Method::GET, "/"), Response::new())
            .await
            .unwrap();

        assert!(!flow.is_halt());
        assert_eq!(flow.into_response().header("x-first"), Some("visited"));
    }

    #[tokio::test]
    async fn test_fn_middleware_halts() {
        let mw = middleware_fn("deny", |_request, response: Response| async move {
            Ok(Flow::Halt(response.with_status(StatusCode::FORBIDDEN)))
        });

        let flow = mw
            .process(Request::new(Method::GET, "/"), Response::new())
            .await
            .unwrap();
        assert!(flow.is_halt());
        assert_eq!(flow.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_fn_middleware_fails() {
        let mw = middleware_fn("boom", |_request, _response| async move {
            Err::<Flow, _>(RouteError::from("denied"))
        });

        let err = mw
            .process(Request::new(Method::GET, "/"), Response::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "denied");
        assert_eq!(mw.name(), "boom");
    }
}
