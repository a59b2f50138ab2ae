//! # Portico Server
//!
//! One set of route declarations, served by interchangeable HTTP engines.
//!
//! This crate provides:
//!
//! - [`Server`]: configuration, route table and the start lifecycle
//! - [`Engine`]: the two-operation contract an engine adapter implements
//! - [`ExpressEngine`] (hyper, continuation-style replies) and
//!   [`HapiEngine`] (axum, return-value replies)
//! - [`Controller`]: composes global, controller and route middleware
//! - [`HttpServer`]: the listener handle, usable in memory before start
//! - Graceful shutdown via [`ShutdownSignal`]
//!
//! ## Example
//!
//! ```rust
//! use bytes::Bytes;
//! use http::{Method, StatusCode};
//! use portico_middleware::handler_fn;
//! use portico_server::{HapiEngine, RouteConfig, Server, ServerConfig};
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
//!                 Ok(response.with_body(id))
//!             }),
//!         )
//!         .build()
//!         .unwrap(),
//!     )
//!     .unwrap();
//!
//! let request = http::Request::get("/items/7").body(Bytes::new()).unwrap();
//! let response = server.http_server().unwrap().dispatch(request).await;
//! assert_eq!(response.status(), StatusCode::OK);
//! assert_eq!(response.body(), &Bytes::from_static(b"7"));
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/portico-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod controller;
mod engine;
pub mod engines;
mod error;
mod route;
mod route_table;
mod server;
mod shutdown;

pub use config::{
    ServerConfig, ServerConfigBuilder, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SHUTDOWN_TIMEOUT_SECS,
};
pub use controller::{Controller, RouteDeclaration};
pub use engine::{Engine, HttpServer, HttpService};
pub use engines::{ExpressApp, ExpressEngine, HapiApp, HapiEngine};
pub use error::ServerError;
pub use route::{default_response, RouteConfig, RouteConfigBuilder};
pub use route_table::RouteTable;
pub use server::Server;
pub use shutdown::{InFlight, InFlightGuard, ShutdownSignal, ShutdownWait};
