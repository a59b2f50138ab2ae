//! # Portico
//!
//! **An HTTP server abstraction with pluggable engines**
//!
//! Portico separates what a service declares from how it is served:
//!
//! - **Normalized request and response** that look the same to every handler
//! - **Middleware chains** run in order, able to halt or fail the request
//! - **A route table** that rejects duplicates and closes once serving starts
//! - **Two engines**: an Express-style one with catch-all support and a
//!   Hapi-style one backed by axum
//! - **Layered configuration** and structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use portico::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new(ExpressEngine::new(), ServerConfig::default());
//!
//!     server.register(
//!         RouteConfig::builder(
//!             Method::GET,
//!             "/items/:id",
//!             handler_fn(|request, response| async move {
//!                 let id = request.param("id").unwrap_or_default().to_string();
//!                 Ok(response.with_body(serde_json::json!({ "id": id })))
//!             }),
//!         )
//!         .build()?,
//!     )?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! register(RouteConfig) ── RouteTable ── Engine::register_route_with_engine
//!                                               │
//! socket ── HttpServer ── native router ── call stack ── handler
//!                                               │
//!                         native response ◄── Response / RouteError
//! ```

#![doc(html_root_url = "https://docs.rs/portico/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use portico_config as config;
pub use portico_core as core;
pub use portico_middleware as middleware;
pub use portico_router as router;
pub use portico_server as server;
pub use portico_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```rust
/// use portico::prelude::*;
///
/// let route = RouteConfig::builder(
///     Method::GET,
///     "/health",
///     handler_fn(|_request, response| async move { Ok(response.with_body("ok")) }),
/// )
/// .build()
/// .unwrap();
/// assert_eq!(route.method_name(), "GET /health");
/// ```
pub mod prelude {
    pub use http::{Method, StatusCode};

    pub use portico_core::{Payload, Request, Response, RouteError, RouteResult};

    pub use portico_middleware::{
        handler_fn, middleware_fn, CallStack, Flow, Handler, Middleware,
    };

    pub use portico_server::{
        Controller, Engine, ExpressEngine, HapiEngine, RouteConfig, RouteDeclaration, Server,
        ServerConfig, ServerError,
    };

    pub use portico_config::{ConfigLoader, EngineKind, PorticoConfig};

    pub use portico_telemetry::{init_logging, LogConfig, LogFormat};
}
