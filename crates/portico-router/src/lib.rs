//! Route patterns and radix tree routing for Portico.
//!
//! This crate owns everything Portico knows about path patterns:
//!
//! - **Canonical syntax**: routes are declared as `/users/:id`
//! - **Translation**: patterns render to brace syntax (`/users/{id}`) for
//!   engines that route that way
//! - **Capabilities**: each engine declares which pattern features it can
//!   express, and anything else fails at registration
//! - **Radix tree matching**: a generic [`Router`] for engines that do
//!   their own dispatch
//!
//! # Example
//!
//! ```rust
//! use portico_router::Router;
//! use http::Method;
//!
//! let mut router = Router::new();
//!
//! router.route(Method::GET, "/users", "listUsers").unwrap();
//! router.route(Method::GET, "/users/:id", "getUser").unwrap();
//! router.route(Method::GET, "/files/*path", "serveFile").unwrap();
//!
//! let m = router.match_route(&Method::GET, "/users/123").unwrap();
//! assert_eq!(*m.value, "getUser");
//! assert_eq!(m.params.get("id"), Some("123"));
//! ```
//!
//! # Architecture
//!
//! The router uses a radix tree where each node represents a path segment:
//!
//! ```text
//!                    (root)
//!                      │
//!              ┌───────┴───────┐
//!              │               │
//!            "users"        "files"
//!              │               │
//!        ┌─────┴─────┐      "*path"
//!        │           │
//!      (leaf)      ":id"
//!       [GET]        │
//!                  (leaf)
//!                  [GET]
//! ```

mod error;
mod method_router;
mod node;
mod params;
mod pattern;
mod router;

pub use error::RouterError;
pub use method_router::MethodRouter;
pub use node::{Node, SegmentKind};
pub use params::Params;
pub use pattern::{Capabilities, PathPattern, Segment, DEFAULT_WILDCARD_NAME};
pub use router::Router;

/// A matched route with its bound value and extracted parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a, T> {
    /// The value bound to the matched `(method, pattern)`
    pub value: &'a T,
    /// Extracted path parameters, percent-decoded
    pub params: Params,
}

impl<'a, T> RouteMatch<'a, T> {
    /// Creates a new route match.
    #[must_use]
    pub fn new(value: &'a T, params: Params) -> Self {
        Self { value, params }
    }
}
