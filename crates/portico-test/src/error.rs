//! Test error types.

use thiserror::Error;

/// Errors that can occur while driving a server in tests.
#[derive(Debug, Error)]
pub enum TestError {
    /// The request could not be built.
    #[error("Request build error: {0}")]
    RequestBuild(String),

    /// A header name or value is not valid HTTP.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// The response body is not what the caller asked for.
    #[error("Body read error: {0}")]
    BodyRead(String),

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A server operation failed.
    #[error("Server error: {0}")]
    Server(#[from] portico_server::ServerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TestError::InvalidHeader("bad name".to_string());
        assert_eq!(err.to_string(), "Invalid header: bad name");
    }

    #[test]
    fn test_json_source() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = TestError::from(source);
        assert!(std::error::Error::source(&err).is_some());
    }
}
