//! The route table.
//!
//! Routes are kept in registration order. Entries are only ever appended,
//! and only while the server is still in its registration phase.

use std::sync::Arc;

use http::Method;

use crate::route::RouteConfig;

/// The ordered set of routes registered on one server.
#[derive(Debug, Default, Clone)]
pub struct RouteTable {
    routes: Vec<Arc<RouteConfig>>,
}

impl RouteTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, route: Arc<RouteConfig>) {
        self.routes.push(route);
    }

    /// Returns true if a route with the same method and the same segments
    /// is already registered.
    #[must_use]
    pub fn contains(&self, route: &RouteConfig) -> bool {
        self.routes.iter().any(|existing| {
            existing.method() == route.method()
                && existing.pattern().segments() == route.pattern().segments()
        })
    }

    /// Returns the routes in registration order.
    #[must_use]
    pub fn routes(&self) -> &[Arc<RouteConfig>] {
        &self.routes
    }

    /// Iterates over the routes in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<RouteConfig>> {
        self.routes.iter()
    }

    /// Returns the number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Returns the first route, in registration order, whose method and
    /// pattern match a concrete request path.
    #[must_use]
    pub fn find(&self, method: &Method, path: &str) -> Option<&Arc<RouteConfig>> {
        self.routes
            .iter()
            .find(|route| route.method() == method && route.pattern().match_path(path).is_some())
    }
}

impl<'a> IntoIterator for &'a RouteTable {
    type Item = &'a Arc<RouteConfig>;
    type IntoIter = std::slice::Iter<'a, Arc<RouteConfig>>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portico_middleware::handler_fn;

    fn route(method: Method, path: &str) -> Arc<RouteConfig> {
        Arc::new(
            RouteConfig::builder(
                method,
                path,
                handler_fn(|_request, response| async move { Ok(response) }),
            )
            .build()
            .unwrap(),
        )
    }

    #[test]
    fn test_keeps_registration_order() {
        let mut table = RouteTable::new();
        table.push(route(Method::GET, "/b"));
        table.push(route(Method::GET, "/a"));
        table.push(route(Method::POST, "/b"));

        let paths: Vec<_> = table.iter().map(|r| (r.method().clone(), r.path())).collect();
        assert_eq!(
            paths,
            vec![
                (Method::GET, "/b"),
                (Method::GET, "/a"),
                (Method::POST, "/b")
            ]
        );
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_contains_compares_segments() {
        let mut table = RouteTable::new();
        table.push(route(Method::GET, "/users/:id"));

        assert!(table.contains(&route(Method::GET, "/users/:id/")));
        assert!(!table.contains(&route(Method::POST, "/users/:id")));
        assert!(!table.contains(&route(Method::GET, "/users/:userId")));
    }

    #[test]
    fn test_find() {
        let mut table = RouteTable::new();
        table.push(route(Method::GET, "/users/:id"));
        table.push(route(Method::GET, "/users/me"));

        let found = table.find(&Method::GET, "/users/me").unwrap();
        assert_eq!(found.path(), "/users/:id");
        assert!(table.find(&Method::DELETE, "/users/me").is_none());
        assert!(table.find(&Method::GET, "/posts").is_none());
    }
}
