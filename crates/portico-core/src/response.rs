//! Normalized outbound response.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use indexmap::IndexMap;

use crate::payload::Payload;

/// An engine-agnostic reply, threaded through the middleware chain.
///
/// Header names are lower-cased and kept in the order they were first
/// set. `set_header` replaces every value in place; `append_header` adds
/// another value, for headers such as `set-cookie` that repeat. Engines
/// emit the status first, then the headers in that order, then the body.
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use portico_core::Response;
/// use serde_json::json;
///
/// let response = Response::new()
///     .with_status(StatusCode::CREATED)
///     .with_header("Location", "/items/7")
///     .with_body(json!({"id": "7"}));
///
/// assert_eq!(response.status(), StatusCode::CREATED);
/// assert_eq!(response.header("location"), Some("/items/7"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: StatusCode,
    headers: IndexMap<String, Vec<String>>,
    body: Payload,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: IndexMap::new(),
            body: Payload::Empty,
        }
    }
}

impl Response {
    /// Creates a `200 OK` response with no headers and no body.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a `200 OK` response with a JSON body.
    #[must_use]
    pub fn json(value: serde_json::Value) -> Self {
        Self::new().with_body(value)
    }

    /// Creates a `200 OK` response with a text body.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::new().with_body(text.into())
    }

    /// Sets the status code.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Sets a header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// Adds a header value, keeping any already set.
    #[must_use]
    pub fn with_appended_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.append_header(name, value);
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Payload>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the status code in place.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Sets a header in place.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_lowercase(), vec![value.into()]);
    }

    /// Adds a header value in place, keeping any already set.
    pub fn append_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers
            .entry(name.to_lowercase())
            .or_default()
            .push(value.into());
    }

    /// Sets the body in place.
    pub fn set_body(&mut self, body: impl Into<Payload>) {
        self.body = body.into();
    }

    /// Removes a header and all its values, keeping the order of the others.
    pub fn remove_header(&mut self, name: &str) -> Option<Vec<String>> {
        self.headers.shift_remove(&name.to_lowercase())
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the headers in emission order.
    #[must_use]
    pub fn headers(&self) -> &IndexMap<String, Vec<String>> {
        &self.headers
    }

    /// Returns the first value of a header, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.header_values(name).first().map(String::as_str)
    }

    /// Returns every value of a header in the order they were added.
    #[must_use]
    pub fn header_values(&self, name: &str) -> &[String] {
        self.headers
            .get(&name.to_lowercase())
            .map_or(&[][..], Vec::as_slice)
    }

    /// Returns the body.
    #[must_use]
    pub fn body(&self) -> &Payload {
        &self.body
    }

    /// Converts into a native `http` response.
    ///
    /// The status is set first, then the recorded headers in order, then a
    /// `content-type` derived from the body if none was recorded, then the
    /// body bytes. Headers that are not valid HTTP are dropped with a
    /// warning.
    #[must_use]
    pub fn into_http(self) -> http::Response<Bytes> {
        let mut native = http::Response::new(self.body.to_bytes());
        *native.status_mut() = self.status;

        let headers = native.headers_mut();
        for (name, value) in self
            .headers
            .iter()
            .flat_map(|(name, values)| values.iter().map(move |value| (name, value)))
        {
            match (
                HeaderName::try_from(name.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => {
                    tracing::warn!(header = %name, "dropping invalid response header");
                }
            }
        }

        if !headers.contains_key(CONTENT_TYPE) {
            if let Some(content_type) = self.body.content_type() {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
            }
        }

        native
    }
}
