//! Normalized inbound request.

use std::sync::Arc;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::request::Parts;
use http::{HeaderMap, Method, Uri};
use indexmap::IndexMap;
use portico_router::Params;

use crate::payload::Payload;

/// An engine-agnostic view of one inbound call.
///
/// Parameter and header names are lower-cased so middleware never depends
/// on how a particular engine spells them. Parameters keep the order they
/// were declared in the route pattern.
///
/// A `Request` is built once per call by the engine adapter. Middleware
/// that wants to change it produces a derived copy with the `with_*`
/// methods and passes that on.
///
/// # Example
///
/// ```
/// use http::Method;
/// use portico_core::Request;
///
/// let request = Request::new(Method::GET, "/items/7")
///     .with_param("itemId", "7")
///     .with_header("X-Trace", "abc");
///
/// assert_eq!(request.param("itemid"), Some("7"));
/// assert_eq!(request.param("ItemId"), Some("7"));
/// assert_eq!(request.header("x-trace"), Some("abc"));
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    params: IndexMap<String, String>,
    headers: IndexMap<String, String>,
    body: Payload,
    native: Option<Arc<Parts>>,
}

impl Request {
    /// Creates a request with no parameters, headers or body.
    ///
    /// An unparsable `uri` falls back to `/`.
    #[must_use]
    pub fn new(method: Method, uri: &str) -> Self {
        Self {
            method,
            uri: uri.parse().unwrap_or_else(|_| Uri::from_static("/")),
            params: IndexMap::new(),
            headers: IndexMap::new(),
            body: Payload::Empty,
            native: None,
        }
    }

    /// Builds a request from the native request head an engine received.
    ///
    /// Headers are normalized, repeated headers are joined with `", "`, and
    /// the body is decoded according to its content type.
    #[must_use]
    pub fn from_parts(parts: Parts, params: Params, body: Bytes) -> Self {
        let headers = normalize_headers(&parts.headers);
        let body = Payload::decode(
            parts
                .headers
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            body,
        );

        let mut request = Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            params: IndexMap::with_capacity(params.len()),
            headers,
            body,
            native: Some(Arc::new(parts)),
        };
        for (name, value) in params {
            request.params.insert(name.to_lowercase(), value);
        }
        request
    }

    /// Returns a copy with an additional path parameter.
    #[must_use]
    pub fn with_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.params.insert(name.to_lowercase(), value.into());
        self
    }

    /// Returns a copy with an additional (or replaced) header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_lowercase(), value.into());
        self
    }

    /// Returns a copy with a different body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Payload>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the full request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the request path, without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the raw query string, if any.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Returns the path parameters in declaration order.
    #[must_use]
    pub fn params(&self) -> &IndexMap<String, String> {
        &self.params
    }

    /// Returns a path parameter by name, ignoring case.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        lookup(&self.params, name)
    }

    /// Returns the normalized headers.
    #[must_use]
    pub fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    /// Returns a header by name, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        lookup(&self.headers, name)
    }

    /// Returns the decoded body.
    #[must_use]
    pub fn body(&self) -> &Payload {
        &self.body
    }

    /// Consumes the request, returning the body.
    #[must_use]
    pub fn into_body(self) -> Payload {
        self.body
    }

    /// Returns the native request head the engine received.
    ///
    /// `None` for requests built by hand. Code that reads it is tied to
    /// the engine's view of the request.
    #[must_use]
    pub fn native(&self) -> Option<&Parts> {
        self.native.as_deref()
    }
}

fn lookup<'a>(map: &'a IndexMap<String, String>, name: &str) -> Option<&'a str> {
    map.get(name)
        .or_else(|| map.get(&name.to_lowercase()))
        .map(String::as_str)
}

fn normalize_headers(headers: &HeaderMap) -> IndexMap<String, String> {
    let mut normalized: IndexMap<String, String> = IndexMap::with_capacity(headers.keys_len());
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        normalized
            .entry(name.as_str().to_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    normalized
}
