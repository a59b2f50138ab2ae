//! Router error types.

use http::Method;
use thiserror::Error;

/// Errors raised while parsing, translating or inserting route patterns.
///
/// All of these surface at registration time. None can occur while a
/// request is being matched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// The pattern does not start with `/`.
    #[error("route pattern '{pattern}' must start with '/'")]
    MissingLeadingSlash {
        /// The offending pattern.
        pattern: String,
    },

    /// A segment uses syntax the canonical form does not allow.
    #[error("invalid segment '{segment}' in route pattern '{pattern}': {reason}")]
    InvalidSegment {
        /// The offending pattern.
        pattern: String,
        /// The offending segment.
        segment: String,
        /// Why the segment was rejected.
        reason: &'static str,
    },

    /// The same parameter name is declared twice in one pattern.
    #[error("parameter '{name}' is declared more than once in '{pattern}'")]
    DuplicateParam {
        /// The offending pattern.
        pattern: String,
        /// The repeated parameter name.
        name: String,
    },

    /// A catch-all segment is followed by further segments.
    #[error("catch-all segment must be the last segment in '{pattern}'")]
    WildcardNotLast {
        /// The offending pattern.
        pattern: String,
    },

    /// The pattern uses syntax the target engine cannot express.
    #[error("route pattern '{pattern}' is not supported: {reason}")]
    Unsupported {
        /// The offending pattern.
        pattern: String,
        /// Which capability is missing.
        reason: &'static str,
    },

    /// Two routes declare different parameter names at the same position.
    #[error("parameter '{name}' in '{pattern}' conflicts with existing parameter '{existing}'")]
    ConflictingParam {
        /// The pattern being inserted.
        pattern: String,
        /// The parameter name in the new pattern.
        name: String,
        /// The parameter name already in the tree.
        existing: String,
    },

    /// The method is already bound for this pattern.
    #[error("{method} {pattern} is already registered")]
    DuplicateRoute {
        /// The HTTP method.
        method: Method,
        /// The pattern.
        pattern: String,
    },
}
