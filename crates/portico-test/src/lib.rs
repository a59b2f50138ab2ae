//! # Portico Test
//!
//! In-memory testing for Portico servers.
//!
//! A [`TestClient`] sends requests into an engine's native service without
//! binding a port, so tests exercise the same routing, parameter decoding
//! and call stacks a real listener would.
//!
//! ## Example
//!
//! ```
//! use http::{Method, StatusCode};
//! use portico_middleware::handler_fn;
//! use portico_server::{HapiEngine, RouteConfig, Server, ServerConfig};
//! use portico_test::TestClient;
//!
//! # tokio_test::block_on(async {
//! let mut server = Server::new(HapiEngine::new(), ServerConfig::default());
//! server
//!     .register(
//!         RouteConfig::builder(
//!             Method::GET,
//!             "/items/:id",
//!             handler_fn(|request, response| async move {
//!                 let id = request.param("id").unwrap_or_default().to_string();
//!                 Ok(response.with_body(serde_json::json!({ "id": id })))
//!             }),
//!         )
//!         .build()
//!         .unwrap(),
//!     )
//!     .unwrap();
//!
//! let client = TestClient::from_server(&mut server).unwrap();
//! client
//!     .get("/items/7")
//!     .send()
//!     .await
//!     .unwrap()
//!     .assert_status(StatusCode::OK)
//!     .assert_json_eq(&serde_json::json!({ "id": "7" }));
//! # });
//! ```

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::TestRequestBuilder;
pub use response::TestResponse;
