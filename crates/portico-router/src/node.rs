//! Radix tree node implementation.
//!
//! Each node represents one path segment. Static children are kept sorted
//! for binary search; a node has at most one parameter child and at most
//! one catch-all child.

use http::Method;

use crate::error::RouterError;
use crate::method_router::MethodRouter;
use crate::params::Params;
use crate::pattern::{PathPattern, Segment};

/// Type of path segment in the radix tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Static path segment (e.g., "users", "api")
    Static,
    /// Named parameter (e.g., ":id")
    Param(String),
    /// Catch-all wildcard (e.g., "*path")
    Wildcard(String),
}

/// A node in the radix tree.
#[derive(Debug, Clone)]
pub struct Node<T> {
    /// The path segment this node represents
    pub segment: String,

    /// The kind of segment (static, param, or wildcard)
    pub kind: SegmentKind,

    /// Method bindings for this node (if it's a route endpoint)
    pub methods: Option<MethodRouter<T>>,

    /// Static children, sorted by segment for binary search
    pub static_children: Vec<Node<T>>,

    /// Parameter child (at most one per node)
    pub param_child: Option<Box<Node<T>>>,

    /// Wildcard child (at most one per node, always a leaf)
    pub wildcard_child: Option<Box<Node<T>>>,
}

impl<T> Node<T> {
    /// Creates a new static node.
    #[must_use]
    pub fn new_static(segment: impl Into<String>) -> Self {
        Self::with_kind(segment.into(), SegmentKind::Static)
    }

    /// Creates a new parameter node.
    #[must_use]
    pub fn new_param(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::with_kind(format!(":{name}"), SegmentKind::Param(name))
    }

    /// Creates a new wildcard node.
    #[must_use]
    pub fn new_wildcard(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::with_kind(format!("*{name}"), SegmentKind::Wildcard(name))
    }

    /// Creates a root node for the tree.
    #[must_use]
    pub fn root() -> Self {
        Self::new_static("")
    }

    fn with_kind(segment: String, kind: SegmentKind) -> Self {
        Self {
            segment,
            kind,
            methods: None,
            static_children: Vec::new(),
            param_child: None,
            wildcard_child: None,
        }
    }

    /// Inserts a route into the tree.
    ///
    /// Optional segments cannot be represented and are rejected, as are
    /// parameter names that conflict with an existing parameter at the
    /// same position and methods already bound for the pattern.
    pub fn insert(
        &mut self,
        pattern: &PathPattern,
        method: Method,
        value: T,
    ) -> Result<(), RouterError> {
        if pattern.has_optional() {
            return Err(RouterError::Unsupported {
                pattern: pattern.as_str().to_string(),
                reason: "optional parameters are not supported by the radix router",
            });
        }

        let leaf = self.descend(pattern, pattern.segments())?;
        leaf.methods
            .get_or_insert_with(MethodRouter::new)
            .insert(method.clone(), value)
            .map_err(|_| RouterError::DuplicateRoute {
                method,
                pattern: pattern.as_str().to_string(),
            })
    }

    /// Walks (and creates) the nodes for the given segments.
    fn descend(
        &mut self,
        pattern: &PathPattern,
        segments: &[Segment],
    ) -> Result<&mut Node<T>, RouterError> {
        let Some((first, remaining)) = segments.split_first() else {
            return Ok(self);
        };

        match first {
            Segment::Static(segment) => {
                let index = match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(segment))
                {
                    Ok(index) => index,
                    Err(index) => {
                        self.static_children.insert(index, Node::new_static(segment));
                        index
                    }
                };
                self.static_children[index].descend(pattern, remaining)
            }
            Segment::Param(name) => {
                let child = self
                    .param_child
                    .get_or_insert_with(|| Box::new(Node::new_param(name)));
                if let SegmentKind::Param(existing) = &child.kind {
                    if existing != name {
                        return Err(RouterError::ConflictingParam {
                            pattern: pattern.as_str().to_string(),
                            name: name.clone(),
                            existing: existing.clone(),
                        });
                    }
                }
                child.descend(pattern, remaining)
            }
            Segment::Wildcard(name) => {
                let child = self
                    .wildcard_child
                    .get_or_insert_with(|| Box::new(Node::new_wildcard(name)));
                if let SegmentKind::Wildcard(existing) = &child.kind {
                    if existing != name {
                        return Err(RouterError::ConflictingParam {
                            pattern: pattern.as_str().to_string(),
                            name: name.clone(),
                            existing: existing.clone(),
                        });
                    }
                }
                Ok(&mut **child)
            }
            Segment::Optional(_) => Err(RouterError::Unsupported {
                pattern: pattern.as_str().to_string(),
                reason: "optional parameters are not supported by the radix router",
            }),
        }
    }

    /// Matches a path against the tree.
    ///
    /// Returns the method bindings and the captured parameters, with
    /// values percent-decoded.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter<T>, Params)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        let methods = self.match_segments(&segments, &mut params)?;
        Some((methods, params))
    }

    fn match_segments<'a>(
        &'a self,
        segments: &[&str],
        params: &mut Params,
    ) -> Option<&'a MethodRouter<T>> {
        let Some((segment, remaining)) = segments.split_first() else {
            return self.methods.as_ref();
        };

        // Static beats parameter beats catch-all.
        if let Some(child) = self.find_static_child(segment) {
            if let Some(methods) = child.match_segments(remaining, params) {
                return Some(methods);
            }
        }

        if let Some(child) = &self.param_child {
            if let SegmentKind::Param(name) = &child.kind {
                let mark = params.len();
                params.push_encoded(name, segment);
                if let Some(methods) = child.match_segments(remaining, params) {
                    return Some(methods);
                }
                params.truncate(mark);
            }
        }

        if let Some(child) = &self.wildcard_child {
            if let SegmentKind::Wildcard(name) = &child.kind {
                if let Some(methods) = child.methods.as_ref() {
                    params.push_encoded(name, &segments.join("/"));
                    return Some(methods);
                }
            }
        }

        None
    }

    fn find_static_child(&self, segment: &str) -> Option<&Node<T>> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}
