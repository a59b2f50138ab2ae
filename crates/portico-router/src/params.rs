//! Captured path parameters.
//!
//! Parameters are kept in capture order, which is the order the names were
//! declared in the route pattern. Most routes capture one or two values, so
//! storage is inline for up to four.

use smallvec::SmallVec;

/// Maximum number of parameters stored inline (stack allocated).
const INLINE_PARAMS: usize = 4;

/// Ordered (name, value) pairs captured from a matched path.
///
/// # Example
///
/// ```rust
/// use portico_router::Params;
///
/// let mut params = Params::new();
/// params.push("userId", "123");
/// params.push_encoded("term", "a%20b");
///
/// assert_eq!(params.get("userId"), Some("123"));
/// assert_eq!(params.get("term"), Some("a b"));
/// assert_eq!(params.get("unknown"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl Params {
    /// Creates a new empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a params set with the given capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: SmallVec::with_capacity(capacity),
        }
    }

    /// Appends an already-decoded parameter.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Appends a parameter whose value is still percent-encoded.
    ///
    /// Values that do not decode to valid UTF-8 are kept as received.
    pub fn push_encoded(&mut self, name: &str, raw: &str) {
        let value = urlencoding::decode(raw)
            .map_or_else(|_| raw.to_string(), std::borrow::Cow::into_owned);
        self.inner.push((name.to_string(), value));
    }

    /// Returns the value for a parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns an iterator over the parameters in capture order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Drops every parameter captured after the first `len`.
    ///
    /// Used to undo captures when a tree branch fails to match.
    pub fn truncate(&mut self, len: usize) {
        self.inner.truncate(len);
    }
}

impl IntoIterator for Params {
    type Item = (String, String);
    type IntoIter = smallvec::IntoIter<[(String, String); INLINE_PARAMS]>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}
