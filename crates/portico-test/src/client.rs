//! Test client for in-memory HTTP testing.

use std::fmt;

use http::Method;
use portico_server::{Engine, HttpServer, Server, ServerError};

use crate::error::TestError;
use crate::request::TestRequestBuilder;
use crate::response::TestResponse;

/// A client that sends requests straight into an engine's native service.
///
/// Requests go through the same path a socket would use: native routing,
/// parameter decoding, the route's call stack and translation back to a
/// native response. No port is bound.
///
/// # Example
///
/// ```
/// use http::{Method, StatusCode};
/// use portico_middleware::handler_fn;
/// use portico_server::{ExpressEngine, RouteConfig, Server, ServerConfig};
/// use portico_test::TestClient;
///
/// # tokio_test::block_on(async {
/// let mut server = Server::new(ExpressEngine::new(), ServerConfig::default());
/// server
///     .register(
///         RouteConfig::builder(
///             Method::GET,
///             "/ping",
///             handler_fn(|_request, response| async move { Ok(response.with_body("pong")) }),
///         )
///         .build()
///         .unwrap(),
///     )
///     .unwrap();
///
/// let client = TestClient::from_server(&mut server).unwrap();
/// let response = client.get("/ping").send().await.unwrap();
/// response.assert_status(StatusCode::OK).assert_body_eq("pong");
/// # });
/// ```
#[must_use]
#[derive(Clone)]
pub struct TestClient {
    server: HttpServer,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Creates a client over a listener handle.
    pub fn new(server: HttpServer) -> Self {
        Self {
            server,
            default_headers: Vec::new(),
        }
    }

    /// Creates a client over a server, initializing its engine if needed.
    ///
    /// Routes registered on the server afterwards are visible to the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails to initialize.
    pub fn from_server<E: Engine>(server: &mut Server<E>) -> Result<Self, ServerError> {
        server.initialize()?;
        let handle = server
            .http_server()
            .cloned()
            .ok_or(ServerError::NotInitialized { engine: E::NAME })?;
        Ok(Self::new(handle))
    }

    /// Adds a header sent with every request, before per-request headers.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Returns the listener handle requests are dispatched to.
    #[must_use]
    pub fn http_server(&self) -> &HttpServer {
        &self.server
    }

    /// Creates a GET request builder.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Creates a POST request builder.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Creates a PUT request builder.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PUT, uri)
    }

    /// Creates a PATCH request builder.
    pub fn patch(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PATCH, uri)
    }

    /// Creates a DELETE request builder.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::DELETE, uri)
    }

    /// Creates a HEAD request builder.
    pub fn head(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::HEAD, uri)
    }

    /// Creates a request builder with any method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        let builder = self
            .default_headers
            .iter()
            .fold(TestRequestBuilder::new(method, uri), |builder, (name, value)| {
                builder.header(name, value)
            });
        TestClientRequest {
            client: self,
            builder,
        }
    }

    /// Sends a prebuilt request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be built.
    pub async fn send(&self, builder: TestRequestBuilder) -> Result<TestResponse, TestError> {
        let request = builder.build()?;
        tracing::debug!(
            engine = self.server.engine_name(),
            method = %request.method(),
            uri = %request.uri(),
            "dispatching test request"
        );
        let response = self.server.dispatch(request).await;
        Ok(TestResponse::from_http(response))
    }
}

impl fmt::Debug for TestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestClient")
            .field("engine", &self.server.engine_name())
            .field("default_headers", &self.default_headers)
            .finish()
    }
}

/// A request being built against a [`TestClient`].
#[must_use]
#[derive(Debug)]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl TestClientRequest<'_> {
    /// Appends a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the Authorization header with a Bearer token.
    pub fn bearer_token(mut self, token: impl AsRef<str>) -> Self {
        self.builder = self.builder.bearer_token(token);
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<bytes::Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets a JSON body.
    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sends the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be built.
    pub async fn send(self) -> Result<TestResponse, TestError> {
        self.client.send(self.builder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::StatusCode;

    fn header_echo() -> TestClient {
        TestClient::new(HttpServer::new("echo", |request: http::Request<Bytes>| async move {
            let seen: Vec<String> = request
                .headers()
                .iter()
                .map(|(name, value)| format!("{}={}", name, value.to_str().unwrap_or_default()))
                .collect();
            http::Response::new(Bytes::from(seen.join(",")))
        }))
    }

    #[tokio::test]
    async fn test_default_headers_come_first() {
        let client = header_echo().with_default_header("x-default", "d");
        let response = client.get("/").header("x-local", "l").send().await.unwrap();

        response
            .assert_status(StatusCode::OK)
            .assert_body_eq("x-default=d,x-local=l");
    }

    #[tokio::test]
    async fn test_build_error_is_returned() {
        let client = header_echo();
        let err = client.get("/").header("bad name", "x").send().await.unwrap_err();
        assert!(matches!(err, TestError::InvalidHeader(_)));
    }

    #[test]
    fn test_debug_names_engine() {
        let client = header_echo();
        assert!(format!("{client:?}").contains("echo"));
    }
}
