//! HTTP method-based routing.
//!
//! A [`MethodRouter`] holds the values bound to one path, keyed by HTTP
//! method. Extension methods are supported alongside the standard verbs.

use http::Method;
use smallvec::SmallVec;

/// Maps HTTP methods to values for a single path.
///
/// `HEAD` requests fall back to the `GET` binding when no explicit `HEAD`
/// binding exists.
///
/// # Example
///
/// ```rust
/// use portico_router::MethodRouter;
/// use http::Method;
///
/// let mut router = MethodRouter::new();
/// router.insert(Method::GET, "listUsers").unwrap();
/// router.insert(Method::POST, "createUser").unwrap();
///
/// assert_eq!(router.get(&Method::GET), Some(&"listUsers"));
/// assert_eq!(router.get(&Method::HEAD), Some(&"listUsers"));
/// assert_eq!(router.get(&Method::DELETE), None);
/// ```
#[derive(Debug, Clone)]
pub struct MethodRouter<T> {
    entries: SmallVec<[(Method, T); 2]>,
}

impl<T> Default for MethodRouter<T> {
    fn default() -> Self {
        Self {
            entries: SmallVec::new(),
        }
    }
}

impl<T> MethodRouter<T> {
    /// Creates a new empty method router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a value to a method.
    ///
    /// Returns the value back if the method is already bound.
    pub fn insert(&mut self, method: Method, value: T) -> Result<(), T> {
        if self.contains(&method) {
            return Err(value);
        }
        self.entries.push((method, value));
        Ok(())
    }

    /// Returns the value bound to a method.
    #[must_use]
    pub fn get(&self, method: &Method) -> Option<&T> {
        self.find(method).or_else(|| {
            if *method == Method::HEAD {
                self.find(&Method::GET)
            } else {
                None
            }
        })
    }

    /// Returns true if the method has an explicit binding.
    #[must_use]
    pub fn contains(&self, method: &Method) -> bool {
        self.find(method).is_some()
    }

    /// Returns true if no methods are bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the bound methods in registration order.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        self.entries.iter().map(|(m, _)| m.clone()).collect()
    }

    fn find(&self, method: &Method) -> Option<&T> {
        self.entries
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut router = MethodRouter::new();
        router.insert(Method::GET, 1).unwrap();
        router.insert(Method::DELETE, 2).unwrap();

        assert_eq!(router.get(&Method::GET), Some(&1));
        assert_eq!(router.get(&Method::DELETE), Some(&2));
        assert_eq!(router.get(&Method::PUT), None);
    }

    #[test]
    fn test_duplicate_method_rejected() {
        let mut router = MethodRouter::new();
        router.insert(Method::GET, 1).unwrap();

        assert_eq!(router.insert(Method::GET, 2), Err(2));
        assert_eq!(router.get(&Method::GET), Some(&1));
    }

    #[test]
    fn test_head_falls_back_to_get() {
        let mut router = MethodRouter::new();
        router.insert(Method::GET, "get").unwrap();
        assert_eq!(router.get(&Method::HEAD), Some(&"get"));
        assert!(!router.contains(&Method::HEAD));

        router.insert(Method::HEAD, "head").unwrap();
        assert_eq!(router.get(&Method::HEAD), Some(&"head"));
    }

    #[test]
    fn test_extension_method() {
        let purge = Method::from_bytes(b"PURGE").unwrap();
        let mut router = MethodRouter::new();
        router.insert(purge.clone(), "purge").unwrap();

        assert_eq!(router.get(&purge), Some(&"purge"));
        assert_eq!(router.allowed_methods(), vec![purge]);
    }
}
