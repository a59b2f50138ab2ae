//! Test response wrapper.

use std::fmt;

use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::TestError;

/// A response with helpers for assertions.
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Wraps a native response.
    #[must_use]
    pub fn from_http(response: http::Response<Bytes>) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the status code as a u16.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns a reference to the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns header names in the order the server emitted them, with
    /// repeated names listed once.
    #[must_use]
    pub fn header_names(&self) -> Vec<&str> {
        self.headers.keys().map(http::HeaderName::as_str).collect()
    }

    /// Gets a header value by name.
    #[must_use]
    pub fn header(&self, name: impl AsRef<str>) -> Option<&HeaderValue> {
        self.headers.get(name.as_ref())
    }

    /// Gets a header value as a string.
    #[must_use]
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.header(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the Content-Type header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(header::CONTENT_TYPE.as_str())
    }

    /// Returns the raw body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as a string.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::BodyRead`] if the body is not valid UTF-8.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| TestError::BodyRead(format!("Invalid UTF-8: {e}")))
    }

    /// Deserializes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Json`] if the body does not deserialize.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Deserializes the body as a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Json`] if the body is not JSON.
    pub fn json_value(&self) -> Result<serde_json::Value, TestError> {
        self.json()
    }

    /// Asserts that the status code equals the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "Expected status {}, got {} with body {:?}",
            expected, self.status, self.body
        );
        self
    }

    /// Asserts that a header exists with the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the header doesn't exist or doesn't match.
    pub fn assert_header(&self, name: impl AsRef<str>, expected: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        let expected = expected.as_ref();
        let actual = self
            .header_str(name)
            .unwrap_or_else(|| panic!("Header '{name}' not found"));
        assert_eq!(actual, expected, "Header '{name}' mismatch");
        self
    }

    /// Asserts that the body equals the expected string.
    ///
    /// # Panics
    ///
    /// Panics if the body is not UTF-8 or doesn't match.
    pub fn assert_body_eq(&self, expected: impl AsRef<str>) -> &Self {
        let body = self.text().expect("Body should be valid UTF-8");
        assert_eq!(body, expected.as_ref(), "Body mismatch");
        self
    }

    /// Asserts that the JSON body matches the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON or doesn't match.
    pub fn assert_json_eq(&self, expected: &serde_json::Value) -> &Self {
        let actual = self.json_value().expect("Body should be valid JSON");
        assert_eq!(&actual, expected, "JSON body mismatch");
        self
    }
}

impl fmt::Debug for TestResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: StatusCode, body: &'static str) -> TestResponse {
        let mut native = http::Response::new(Bytes::from_static(body.as_bytes()));
        *native.status_mut() = status;
        native
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        TestResponse::from_http(native)
    }

    #[test]
    fn test_accessors() {
        let response = response(StatusCode::CREATED, r#"{"id":"7"}"#);
        assert_eq!(response.status_code(), 201);
        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(response.header_names(), vec!["content-type"]);
        response.assert_json_eq(&json!({ "id": "7" }));
    }

    #[test]
    fn test_invalid_json() {
        let response = response(StatusCode::OK, "not json");
        assert!(matches!(response.json_value(), Err(TestError::Json(_))));
        response.assert_body_eq("not json");
    }

    #[test]
    #[should_panic(expected = "Expected status")]
    fn test_assert_status_panics() {
        response(StatusCode::OK, "").assert_status(StatusCode::NOT_FOUND);
    }
}
