//! Server error types.
//!
//! Registration and startup errors are operator-facing: they stop a server
//! from starting. Handler-chain errors never appear here; engines turn them
//! into error replies.

use std::io;

use http::Method;
use portico_router::RouterError;
use thiserror::Error;

/// Errors raised while registering routes or starting a server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The engine cannot express the route's pattern, or the pattern is
    /// invalid.
    #[error("cannot register {method} {path}: {source}")]
    Registration {
        /// The route's method.
        method: Method,
        /// The route's canonical path.
        path: String,
        /// What the router rejected.
        #[source]
        source: RouterError,
    },

    /// The method and path are already registered.
    #[error("{method} {path} is already registered")]
    DuplicateRoute {
        /// The route's method.
        method: Method,
        /// The route's canonical path.
        path: String,
    },

    /// A route was registered after the server started serving.
    #[error("cannot register {method} {path}: the server has already started")]
    RegistrationClosed {
        /// The route's method.
        method: Method,
        /// The route's canonical path.
        path: String,
    },

    /// `start` was called on a server that is already serving.
    #[error("the server has already started")]
    AlreadyStarted,

    /// The configured host and port do not resolve to an address.
    #[error("invalid listen address '{address}': {source}")]
    InvalidAddress {
        /// The configured `host:port`.
        address: String,
        /// The resolution error.
        #[source]
        source: io::Error,
    },

    /// The listener could not bind.
    #[error("failed to bind {address}: {source}")]
    Bind {
        /// The address that was tried.
        address: String,
        /// The bind error.
        #[source]
        source: io::Error,
    },

    /// `start` was called after one or more routes failed to register.
    #[error("refusing to start: {count} route registration(s) failed, first: {first}")]
    RegistrationFailed {
        /// How many registrations failed.
        count: usize,
        /// The first failure.
        first: String,
    },

    /// An engine operation ran before the engine was initialized.
    #[error("the {engine} engine has not been initialized")]
    NotInitialized {
        /// The engine's name.
        engine: &'static str,
    },
}

impl ServerError {
    /// Wraps a router error for a route.
    ///
    /// Duplicate bindings become [`ServerError::DuplicateRoute`].
    #[must_use]
    pub fn from_router(method: &Method, path: &str, source: RouterError) -> Self {
        match source {
            RouterError::DuplicateRoute { .. } => Self::DuplicateRoute {
                method: method.clone(),
                path: path.to_string(),
            },
            source => Self::Registration {
                method: method.clone(),
                path: path.to_string(),
                source,
            },
        }
    }

    /// Returns true for errors raised while registering a route.
    #[must_use]
    pub fn is_registration(&self) -> bool {
        matches!(
            self,
            Self::Registration { .. } | Self::DuplicateRoute { .. } | Self::RegistrationClosed { .. }
        )
    }
}
