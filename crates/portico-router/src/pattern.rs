//! Route pattern parsing and syntax translation.
//!
//! Route declarations always use the canonical colon syntax
//! (`/users/:id`). Engines that route with a different syntax translate
//! the parsed [`PathPattern`] once, at registration time, via
//! [`PathPattern::to_brace_syntax`]. Engines declare what they can express
//! with [`Capabilities`]; a pattern outside those capabilities is rejected
//! before it ever reaches the engine.
//!
//! # Canonical syntax
//!
//! | Segment | Meaning |
//! |---------|---------|
//! | `users` | Static segment |
//! | `:id` | Named parameter, matches one segment |
//! | `:id?` | Optional parameter |
//! | `*path` | Catch-all, matches the rest of the path (must be last) |
//!
//! # Example
//!
//! ```rust
//! use portico_router::PathPattern;
//!
//! let pattern = PathPattern::parse("/orgs/:orgId/users/:userId").unwrap();
//! assert_eq!(pattern.to_brace_syntax().unwrap(), "/orgs/{orgId}/users/{userId}");
//!
//! let params = pattern.match_path("/orgs/acme/users/42").unwrap();
//! assert_eq!(params.get("orgId"), Some("acme"));
//! assert_eq!(params.get("userId"), Some("42"));
//! ```

use std::fmt;

use crate::error::RouterError;
use crate::params::Params;

/// Name given to a bare `*` catch-all.
pub const DEFAULT_WILDCARD_NAME: &str = "wildcard";

/// One segment of a parsed route pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Literal text that must match exactly.
    Static(String),
    /// Named parameter matching exactly one segment.
    Param(String),
    /// Named parameter that may be absent.
    Optional(String),
    /// Catch-all matching the remainder of the path.
    Wildcard(String),
}

impl Segment {
    /// Returns the parameter name if this segment captures a value.
    #[must_use]
    pub fn param_name(&self) -> Option<&str> {
        match self {
            Self::Static(_) => None,
            Self::Param(name) | Self::Optional(name) | Self::Wildcard(name) => Some(name),
        }
    }
}

/// Syntax features an engine can express natively.
///
/// Plain parameters and static segments are always supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Whether trailing catch-all segments are supported.
    pub catch_all: bool,
    /// Whether optional parameters are supported.
    pub optional: bool,
}

impl Capabilities {
    /// Static segments and single-segment parameters only.
    pub const PARAMS_ONLY: Self = Self {
        catch_all: false,
        optional: false,
    };

    /// Parameters plus a trailing catch-all.
    pub const WITH_CATCH_ALL: Self = Self {
        catch_all: true,
        optional: false,
    };

    /// Fails with [`RouterError::Unsupported`] if the pattern needs a
    /// feature these capabilities lack.
    pub fn check(&self, pattern: &PathPattern) -> Result<(), RouterError> {
        if !self.catch_all && pattern.has_wildcard() {
            return Err(RouterError::Unsupported {
                pattern: pattern.as_str().to_string(),
                reason: "multi-segment (catch-all) parameters are not supported by this engine",
            });
        }
        if !self.optional && pattern.has_optional() {
            return Err(RouterError::Unsupported {
                pattern: pattern.as_str().to_string(),
                reason: "optional parameters are not supported by this engine",
            });
        }
        Ok(())
    }
}

/// A route pattern parsed from canonical colon syntax.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parses a canonical pattern such as `/users/:id`.
    ///
    /// Empty segments are ignored, so `/users/` and `/users` are the same
    /// pattern.
    pub fn parse(pattern: &str) -> Result<Self, RouterError> {
        let body = pattern
            .strip_prefix('/')
            .ok_or_else(|| RouterError::MissingLeadingSlash {
                pattern: pattern.to_string(),
            })?;

        let mut segments = Vec::new();
        for raw in body.split('/').filter(|s| !s.is_empty()) {
            segments.push(parse_colon_segment(pattern, raw)?);
        }

        let pattern = Self {
            raw: pattern.to_string(),
            segments,
        };
        pattern.validate()?;
        Ok(pattern)
    }

    /// Parses a brace-syntax pattern such as `/users/{id}` back into
    /// canonical form.
    ///
    /// Only static segments and `{name}` parameters are accepted.
    pub fn parse_brace(pattern: &str) -> Result<Self, RouterError> {
        let body = pattern
            .strip_prefix('/')
            .ok_or_else(|| RouterError::MissingLeadingSlash {
                pattern: pattern.to_string(),
            })?;

        let mut canonical = String::with_capacity(pattern.len());
        for raw in body.split('/').filter(|s| !s.is_empty()) {
            canonical.push('/');
            match raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => {
                    canonical.push(':');
                    canonical.push_str(name);
                }
                None => canonical.push_str(raw),
            }
        }
        if canonical.is_empty() {
            canonical.push('/');
        }

        Self::parse(&canonical)
    }

    /// Returns the pattern as it was declared.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the parsed segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the declared parameter names in declaration order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(Segment::param_name)
    }

    /// Returns true if the pattern ends in a catch-all.
    #[must_use]
    pub fn has_wildcard(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Wildcard(_)))
    }

    /// Returns true if the pattern contains an optional parameter.
    #[must_use]
    pub fn has_optional(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Optional(_)))
    }

    /// Renders the pattern in canonical colon syntax.
    #[must_use]
    pub fn to_colon_syntax(&self) -> String {
        self.render(|segment, out| match segment {
            Segment::Static(s) => out.push_str(s),
            Segment::Param(name) => {
                out.push(':');
                out.push_str(name);
            }
            Segment::Optional(name) => {
                out.push(':');
                out.push_str(name);
                out.push('?');
            }
            Segment::Wildcard(name) => {
                out.push('*');
                out.push_str(name);
            }
        })
    }

    /// Renders the pattern in brace syntax (`/users/{id}`).
    ///
    /// Brace syntax has no canonical spelling for optional or catch-all
    /// segments, so those are rejected.
    pub fn to_brace_syntax(&self) -> Result<String, RouterError> {
        Capabilities::PARAMS_ONLY.check(self)?;
        Ok(self.render(|segment, out| match segment {
            Segment::Static(s) => out.push_str(s),
            Segment::Param(name) | Segment::Optional(name) | Segment::Wildcard(name) => {
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
        }))
    }

    /// Matches a concrete request path directly against this pattern.
    ///
    /// Parameter values are percent-decoded. Returns `None` if the path
    /// does not match.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<Params> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::with_capacity(self.segments.len());
        let mut index = 0;

        for segment in &self.segments {
            match segment {
                Segment::Static(expected) => {
                    if parts.get(index) != Some(&expected.as_str()) {
                        return None;
                    }
                    index += 1;
                }
                Segment::Param(name) => {
                    let value = parts.get(index)?;
                    params.push_encoded(name, value);
                    index += 1;
                }
                Segment::Optional(name) => {
                    if let Some(value) = parts.get(index) {
                        params.push_encoded(name, value);
                        index += 1;
                    }
                }
                Segment::Wildcard(name) => {
                    let rest = parts.get(index..)?.join("/");
                    params.push_encoded(name, &rest);
                    index = parts.len();
                }
            }
        }

        (index == parts.len()).then_some(params)
    }

    fn render(&self, mut write: impl FnMut(&Segment, &mut String)) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        let mut out = String::with_capacity(self.raw.len() + self.segments.len());
        for segment in &self.segments {
            out.push('/');
            write(segment, &mut out);
        }
        out
    }

    fn validate(&self) -> Result<(), RouterError> {
        let mut seen: Vec<&str> = Vec::new();
        for (i, segment) in self.segments.iter().enumerate() {
            if matches!(segment, Segment::Wildcard(_)) && i + 1 != self.segments.len() {
                return Err(RouterError::WildcardNotLast {
                    pattern: self.raw.clone(),
                });
            }
            if let Some(name) = segment.param_name() {
                if seen.contains(&name) {
                    return Err(RouterError::DuplicateParam {
                        pattern: self.raw.clone(),
                        name: name.to_string(),
                    });
                }
                seen.push(name);
            }
        }
        Ok(())
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_colon_segment(pattern: &str, raw: &str) -> Result<Segment, RouterError> {
    let invalid = |reason| RouterError::InvalidSegment {
        pattern: pattern.to_string(),
        segment: raw.to_string(),
        reason,
    };

    if let Some(name) = raw.strip_prefix(':') {
        // Express-style `:path*` is a named catch-all.
        if let Some(name) = name.strip_suffix('*') {
            return valid_name(name)
                .then(|| Segment::Wildcard(name.to_string()))
                .ok_or_else(|| invalid("parameter names may only contain letters, digits, '_' and '-'"));
        }
        if let Some(name) = name.strip_suffix('?') {
            return valid_name(name)
                .then(|| Segment::Optional(name.to_string()))
                .ok_or_else(|| invalid("parameter names may only contain letters, digits, '_' and '-'"));
        }
        return valid_name(name)
            .then(|| Segment::Param(name.to_string()))
            .ok_or_else(|| invalid("parameter names may only contain letters, digits, '_' and '-'"));
    }

    if let Some(name) = raw.strip_prefix('*') {
        if name.is_empty() {
            return Ok(Segment::Wildcard(DEFAULT_WILDCARD_NAME.to_string()));
        }
        return valid_name(name)
            .then(|| Segment::Wildcard(name.to_string()))
            .ok_or_else(|| invalid("catch-all names may only contain letters, digits, '_' and '-'"));
    }

    if raw.contains(&['*', '?'][..]) {
        return Err(invalid("wildcard and optional markers are only allowed at the start of a segment"));
    }
    if raw.contains(&[':', '{', '}'][..]) {
        return Err(invalid("parameters must span a whole segment and use ':name'"));
    }

    Ok(Segment::Static(raw.to_string()))
}

fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
