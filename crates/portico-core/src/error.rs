//! Handler-chain errors.
//!
//! A [`RouteError`] is what a middleware stage or handler fails with. The
//! engine adapter turns it into the reply: the carried status when it is an
//! error status, `500 Internal Server Error` otherwise, with the error
//! payload as the body.

use http::StatusCode;
use thiserror::Error;

use crate::payload::Payload;
use crate::response::Response;

/// Result type for middleware stages and handlers.
pub type RouteResult<T = Response> = Result<T, RouteError>;

/// A failure raised while running a route's call stack.
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use portico_core::RouteError;
///
/// let err = RouteError::from("denied");
/// assert_eq!(err.resolved_status(), StatusCode::INTERNAL_SERVER_ERROR);
///
/// let err = RouteError::with_status(StatusCode::FORBIDDEN, "denied");
/// assert_eq!(err.resolved_status(), StatusCode::FORBIDDEN);
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{payload}")]
pub struct RouteError {
    status: Option<StatusCode>,
    payload: Payload,
}

impl RouteError {
    /// Creates an error with no status; it resolves to `500`.
    #[must_use]
    pub fn new(payload: impl Into<Payload>) -> Self {
        Self {
            status: None,
            payload: payload.into(),
        }
    }

    /// Creates an error carrying a status.
    ///
    /// Statuses below `400` are ignored when the error is resolved.
    #[must_use]
    pub fn with_status(status: StatusCode, payload: impl Into<Payload>) -> Self {
        Self {
            status: Some(status),
            payload: payload.into(),
        }
    }

    /// Returns the carried status, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Returns the status the reply is emitted with.
    #[must_use]
    pub fn resolved_status(&self) -> StatusCode {
        self.status
            .filter(|s| s.is_client_error() || s.is_server_error())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Returns the error payload.
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Converts into the error reply.
    #[must_use]
    pub fn into_response(self) -> Response {
        let status = self.resolved_status();
        Response::new().with_status(status).with_body(self.payload)
    }
}

impl From<&str> for RouteError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for RouteError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<serde_json::Value> for RouteError {
    fn from(value: serde_json::Value) -> Self {
        Self::new(value)
    }
}

impl From<Payload> for RouteError {
    fn from(payload: Payload) -> Self {
        Self::new(payload)
    }
}

impl From<serde_json::Error> for RouteError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, err.to_string())
    }
}
