//! # Portico Middleware
//!
//! The middleware chain for Portico routes.
//!
//! Every route runs a [`CallStack`]: global middleware, controller
//! middleware, then the route [`Handler`]. Stages run strictly in order and
//! each one is awaited before the next begins.
//!
//! ```text
//! global → controller → handler
//!   │          │           │
//!   └─ Flow::Next ─────────┘ → Response
//!   └─ Flow::Halt  → Response (handler skipped)
//!   └─ Err(RouteError) → error reply built by the engine
//! ```
//!
//! ## Example
//!
//! ```
//! use portico_core::{Request, Response};
//! use portico_middleware::{handler_fn, stages::DebugLog, CallStack};
//!
//! # tokio_test::block_on(async {
//! let stack = CallStack::new(handler_fn(|request, response| async move {
//!     Ok(response.with_body(request.path().to_string()))
//! }))
//! .with(DebugLog::new());
//!
//! let response = stack
//!     .run(Request::new(http::Method::GET, "/ping"), Response::new())
//!     .await
//!     .unwrap();
//! assert_eq!(response.body().as_text(), Some("/ping"));
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/portico-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod call_stack;
pub mod handler;
pub mod middleware;
pub mod stages;

pub use call_stack::{CallStack, CallStackHandler};
pub use handler::{handler_fn, FnHandler, Handler};
pub use middleware::{middleware_fn, BoxFuture, Flow, FnMiddleware, Middleware};
