//! High-level router API.
//!
//! This module provides the main [`Router`] struct which is the primary
//! interface for building and matching routes.

use http::Method;

use crate::error::RouterError;
use crate::method_router::MethodRouter;
use crate::node::Node;
use crate::params::Params;
use crate::pattern::PathPattern;
use crate::RouteMatch;

/// A radix tree router mapping `(method, pattern)` pairs to values.
///
/// # Example
///
/// ```rust
/// use portico_router::Router;
/// use http::Method;
///
/// let mut router = Router::new();
/// router.route(Method::GET, "/users", "listUsers").unwrap();
/// router.route(Method::GET, "/users/:id", "getUser").unwrap();
///
/// let m = router.match_route(&Method::GET, "/users/123").unwrap();
/// assert_eq!(*m.value, "getUser");
/// assert_eq!(m.params.get("id"), Some("123"));
/// ```
///
/// # Route Priority
///
/// When multiple routes could match, the router uses the following priority:
///
/// 1. **Static segments** (e.g., `/users/me`)
/// 2. **Parameter segments** (e.g., `/users/:id`)
/// 3. **Wildcard segments** (e.g., `/files/*path`)
///
/// This means `/users/me` will match before `/users/:id` for the path `/users/me`.
#[derive(Debug, Clone)]
pub struct Router<T> {
    /// Root node of the radix tree
    root: Node<T>,
    /// Number of `(method, pattern)` bindings
    route_count: usize,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<T> {
    /// Creates a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            route_count: 0,
        }
    }

    /// Inserts a value for an already-parsed pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern uses optional segments, conflicts
    /// with a parameter already in the tree, or the method is already
    /// bound for it. The router is left unchanged on `DuplicateRoute`.
    pub fn insert(
        &mut self,
        method: Method,
        pattern: &PathPattern,
        value: T,
    ) -> Result<(), RouterError> {
        self.root.insert(pattern, method, value)?;
        self.route_count += 1;
        Ok(())
    }

    /// Parses a canonical pattern and inserts a value for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern fails to parse or cannot be
    /// inserted (see [`Router::insert`]).
    pub fn route(&mut self, method: Method, pattern: &str, value: T) -> Result<(), RouterError> {
        let pattern = PathPattern::parse(pattern)?;
        self.insert(method, &pattern, value)
    }

    /// Matches a request against the router.
    ///
    /// Returns `None` if no route matches the path or the matched path has
    /// no binding for the method.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        let (methods, params) = self.root.match_path(path)?;
        let value = methods.get(method)?;
        Some(RouteMatch::new(value, params))
    }

    /// Matches only the path, returning all method bindings.
    ///
    /// Useful for telling "not found" apart from "method not allowed".
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter<T>, Params)> {
        self.root.match_path(path)
    }

    /// Returns the number of `(method, pattern)` bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_new() {
        let router: Router<()> = Router::new();
        assert!(router.is_empty());
        assert_eq!(router.len(), 0);
    }

    #[test]
    fn test_router_counts_bindings() {
        let mut router = Router::new();
        router.route(Method::GET, "/users", 1).unwrap();
        router.route(Method::POST, "/users", 2).unwrap();
        router.route(Method::GET, "/users/:id", 3).unwrap();

        assert_eq!(router.len(), 3);
    }

    #[test]
    fn test_duplicate_binding_leaves_count() {
        let mut router = Router::new();
        router.route(Method::GET, "/users", 1).unwrap();

        let err = router.route(Method::GET, "/users", 2).unwrap_err();
        assert!(matches!(err, RouterError::DuplicateRoute { .. }));
        assert_eq!(router.len(), 1);
        assert_eq!(*router.match_route(&Method::GET, "/users").unwrap().value, 1);
    }

    #[test]
    fn test_method_not_bound() {
        let mut router = Router::new();
        router.route(Method::GET, "/users", "listUsers").unwrap();

        assert!(router.match_route(&Method::DELETE, "/users").is_none());

        let (methods, _) = router.match_path("/users").unwrap();
        assert_eq!(methods.allowed_methods(), vec![Method::GET]);
    }

    #[test]
    fn test_trailing_slash_is_ignored() {
        let mut router = Router::new();
        router.route(Method::GET, "/users/", "listUsers").unwrap();

        assert!(router.match_route(&Method::GET, "/users").is_some());
        assert!(router.match_route(&Method::GET, "/users/").is_some());
    }

    #[test]
    fn test_parse_errors_propagate() {
        let mut router: Router<()> = Router::new();
        assert!(matches!(
            router.route(Method::GET, "users", ()).unwrap_err(),
            RouterError::MissingLeadingSlash { .. }
        ));
        assert!(router.is_empty());
    }
}
