//! Debug logging middleware.
//!
//! Logs every request that reaches it at `debug` level and continues the
//! chain untouched. Useful as a global stage while developing.

use portico_core::{Request, Response, RouteResult};

use crate::middleware::{BoxFuture, Flow, Middleware};

/// Middleware that logs the method, path, params and headers of each
/// request.
///
/// # Example
///
/// ```
/// use portico_middleware::stages::DebugLog;
/// use portico_middleware::Middleware;
///
/// let stage = DebugLog::new();
/// assert_eq!(stage.name(), "debug_log");
/// ```
#[derive(Debug, Clone, Default)]
pub struct DebugLog {
    include_headers: bool,
}

impl DebugLog {
    /// Creates a debug log stage that includes headers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            include_headers: true,
        }
    }

    /// Creates a debug log stage that omits headers, for when they may
    /// carry credentials.
    #[must_use]
    pub fn without_headers() -> Self {
        Self {
            include_headers: false,
        }
    }
}

impl Middleware for DebugLog {
    fn name(&self) -> &'static str {
        "debug_log"
    }

    fn process(&self, request: Request, response: Response) -> BoxFuture<'_, RouteResult<Flow>> {
        Box::pin(async move {
            if self.include_headers {
                tracing::debug!(
                    method = %request.method(),
                    path = request.path(),
                    params = ?request.params(),
                    headers = ?request.headers(),
                    "request"
                );
            } else {
                tracing::debug!(
                    method = %request.method(),
                    path = request.path(),
                    params = ?request.params(),
                    "request"
                );
            }
            Ok(Flow::Next(request, response))
        })
    }
}
