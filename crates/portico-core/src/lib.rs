//! # Portico Core
//!
//! Engine-agnostic value types shared by every Portico engine:
//!
//! - [`Request`] - Normalized inbound call (method, lower-cased params and headers, body)
//! - [`Response`] - Builder-style reply threaded through the middleware chain
//! - [`Payload`] - Untyped body (empty, JSON, text or binary)
//! - [`RouteError`] - Handler-chain failure and its mapping to an error reply
//!
//! Middleware and handlers only ever see these types, so the same route
//! declarations run unchanged on any engine.

#![doc(html_root_url = "https://docs.rs/portico-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod payload;
mod request;
mod response;

pub use error::{RouteError, RouteResult};
pub use payload::{Payload, BINARY_CONTENT_TYPE, JSON_CONTENT_TYPE, TEXT_CONTENT_TYPE};
pub use request::Request;
pub use response::Response;
