//! Test request building.

use bytes::Bytes;
use http::{header, HeaderName, HeaderValue, Method, Uri};
use serde::Serialize;

use crate::error::TestError;

/// Builder for requests sent through a [`TestClient`](crate::TestClient).
///
/// Errors (bad header, bad URI, unserializable JSON) are held until
/// [`build`](TestRequestBuilder::build) so calls can be chained.
///
/// # Example
///
/// ```
/// use http::Method;
/// use portico_test::TestRequestBuilder;
///
/// let request = TestRequestBuilder::new(Method::POST, "/items")
///     .header("x-request-id", "42")
///     .json(&serde_json::json!({ "name": "widget" }))
///     .build()
///     .unwrap();
///
/// assert_eq!(request.headers()["content-type"], "application/json");
/// ```
#[must_use]
#[derive(Debug)]
pub struct TestRequestBuilder {
    method: Method,
    uri: String,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Bytes,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Creates a new request builder.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            headers: Vec::new(),
            body: Bytes::new(),
            error: None,
        }
    }

    /// Appends a header. Repeated names are all sent, in order.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if self.error.is_some() {
            return self;
        }

        let name = name.as_ref();
        match (
            HeaderName::try_from(name),
            HeaderValue::try_from(value.as_ref()),
        ) {
            (Ok(name), Ok(value)) => self.headers.push((name, value)),
            _ => self.error = Some(TestError::InvalidHeader(name.to_string())),
        }
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets the Authorization header with a Bearer token.
    pub fn bearer_token(self, token: impl AsRef<str>) -> Self {
        self.header(
            header::AUTHORIZATION.as_str(),
            format!("Bearer {}", token.as_ref()),
        )
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the body as JSON and the Content-Type to `application/json`.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                self.body = Bytes::from(bytes);
                self.content_type("application/json")
            }
            Err(err) => {
                self.error.get_or_insert(TestError::Json(err));
                self
            }
        }
    }

    /// Builds the native request.
    ///
    /// # Errors
    ///
    /// Returns the first error recorded while building, or
    /// [`TestError::RequestBuild`] if the URI is invalid.
    pub fn build(self) -> Result<http::Request<Bytes>, TestError> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let uri: Uri = self
            .uri
            .parse()
            .map_err(|e| TestError::RequestBuild(format!("Invalid URI: {e}")))?;

        let mut request = http::Request::new(self.body);
        *request.method_mut() = self.method;
        *request.uri_mut() = uri;
        let headers = request.headers_mut();
        for (name, value) in self.headers {
            headers.append(name, value);
        }
        Ok(request)
    }
}
