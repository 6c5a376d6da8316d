//! Trie vertex and the per-segment registration/matching rules.
//!
//! A node owns a map of static children and at most one dynamic child. The
//! dynamic child's [`NodeKind`] says whether it is a named parameter, a
//! regex-constrained parameter or a wildcard, so two different dynamic kinds
//! can never coexist at one tree position.

use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

use super::error::RouteError;

/// Classification of a trie vertex.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// The per-method root (`/`)
    Root,
    /// Literal segment, matched by string equality
    Static,
    /// `:name(pattern)`, matches a segment that satisfies `pattern`
    Regex {
        /// Parameter name the captured segment is stored under
        name: Arc<str>,
        /// Pattern as written at registration, used for conflict detection
        source: String,
        /// Anchored, compiled form of `source`
        pattern: Regex,
    },
    /// `:name`, matches any single segment
    Param {
        /// Parameter name the captured segment is stored under
        name: Arc<str>,
    },
    /// `*`, matches one segment, or every remaining segment when trailing
    Wildcard,
}

impl NodeKind {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Static => "static",
            NodeKind::Regex { .. } => "regex",
            NodeKind::Param { .. } => "param",
            NodeKind::Wildcard => "wildcard",
        }
    }

    /// Parameter name for `Param` and `Regex` nodes.
    pub fn param_name(&self) -> Option<&Arc<str>> {
        match self {
            NodeKind::Regex { name, .. } | NodeKind::Param { name } => Some(name),
            _ => None,
        }
    }
}

/// One vertex of a method's routing tree.
#[derive(Debug, Clone)]
pub struct Node<T> {
    /// Raw registration segment (`user`, `:id`, `:id([0-9]+)`, `*`)
    pub(crate) segment: String,
    pub(crate) kind: NodeKind,
    pub(crate) children: HashMap<String, Node<T>>,
    pub(crate) dynamic: Option<Box<Node<T>>>,
    pub(crate) value: Option<T>,
    /// Registration path of the route terminating here, empty otherwise
    pub(crate) full_path: String,
}

/// Split a raw `:` segment into `(name, pattern)` when it carries a
/// well-formed `(pattern)` suffix.
fn parse_param(segment: &str) -> (&str, Option<&str>) {
    let body = &segment[1..];
    if let Some((name, rest)) = body.split_once('(') {
        if let Some(expr) = rest.strip_suffix(')') {
            return (name, Some(expr));
        }
    }
    (body, None)
}

impl<T> Node<T> {
    pub(crate) fn root() -> Self {
        Self::with_kind("/", NodeKind::Root)
    }

    fn with_kind(segment: &str, kind: NodeKind) -> Self {
        Self {
            segment: segment.to_string(),
            kind,
            children: HashMap::new(),
            dynamic: None,
            value: None,
            full_path: String::new(),
        }
    }

    /// Node kind.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Raw registration segment.
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// Whether a lookup that finds no child here may end on this node,
    /// with the remaining segments consumed.
    ///
    /// True for a `*` node without a `*` child below it: the wildcard is the
    /// last dynamic segment of its pattern and matches the rest of the path.
    pub(crate) fn absorbs_rest(&self) -> bool {
        matches!(self.kind, NodeKind::Wildcard)
            && !matches!(
                self.dynamic.as_deref().map(|d| &d.kind),
                Some(NodeKind::Wildcard)
            )
    }

    /// Fetch or create the child for one registration segment.
    pub(crate) fn child_or_create(&mut self, segment: &str) -> Result<&mut Node<T>, RouteError> {
        if segment.starts_with(':') {
            let (name, expr) = parse_param(segment);
            if name.is_empty() {
                return Err(RouteError::EmptyParamName {
                    segment: segment.to_string(),
                });
            }
            return match expr {
                Some(expr) => self.regex_child_or_create(segment, name, expr),
                None => self.param_child_or_create(segment, name),
            };
        }
        if segment == "*" {
            return self.wildcard_child_or_create(segment);
        }
        Ok(self
            .children
            .entry(segment.to_string())
            .or_insert_with(|| Node::with_kind(segment, NodeKind::Static)))
    }

    fn regex_child_or_create(
        &mut self,
        segment: &str,
        name: &str,
        expr: &str,
    ) -> Result<&mut Node<T>, RouteError> {
        self.dynamic_child_or_create(
            |existing| match &existing.kind {
                NodeKind::Regex {
                    name: existing_name,
                    source,
                    ..
                } if existing_name.as_ref() == name && source == expr => Ok(()),
                NodeKind::Regex { .. } => Err(RouteError::RegexConflict {
                    existing: existing.segment.clone(),
                    new: segment.to_string(),
                }),
                other => Err(RouteError::MixedDynamic {
                    existing: other.label(),
                    new: "regex",
                    segment: segment.to_string(),
                }),
            },
            || {
                let pattern = Regex::new(expr).map_err(|source| {
                    RouteError::InvalidRegex {
                        segment: segment.to_string(),
                        source,
                    }
                })?;
                Ok(Node::with_kind(
                    segment,
                    NodeKind::Regex {
                        name: Arc::from(name),
                        source: expr.to_string(),
                        pattern,
                    },
                ))
            },
        )
    }

    fn param_child_or_create(&mut self, segment: &str, name: &str) -> Result<&mut Node<T>, RouteError> {
        self.dynamic_child_or_create(
            |existing| match &existing.kind {
                NodeKind::Param { .. } if existing.segment == segment => Ok(()),
                NodeKind::Param { .. } => Err(RouteError::ParamConflict {
                    existing: existing.segment.clone(),
                    new: segment.to_string(),
                }),
                other => Err(RouteError::MixedDynamic {
                    existing: other.label(),
                    new: "param",
                    segment: segment.to_string(),
                }),
            },
            || {
                Ok(Node::with_kind(
                    segment,
                    NodeKind::Param {
                        name: Arc::from(name),
                    },
                ))
            },
        )
    }

    fn wildcard_child_or_create(&mut self, segment: &str) -> Result<&mut Node<T>, RouteError> {
        self.dynamic_child_or_create(
            |existing| match &existing.kind {
                NodeKind::Wildcard => Ok(()),
                other => Err(RouteError::MixedDynamic {
                    existing: other.label(),
                    new: "wildcard",
                    segment: segment.to_string(),
                }),
            },
            || Ok(Node::with_kind(segment, NodeKind::Wildcard)),
        )
    }

    /// Reuse the dynamic child if `check` accepts it, otherwise fill the
    /// empty slot with `build`. The slot is left untouched on error.
    fn dynamic_child_or_create(
        &mut self,
        check: impl FnOnce(&Node<T>) -> Result<(), RouteError>,
        build: impl FnOnce() -> Result<Node<T>, RouteError>,
    ) -> Result<&mut Node<T>, RouteError> {
        let child = match self.dynamic.take() {
            Some(existing) => {
                if let Err(err) = check(&*existing) {
                    self.dynamic = Some(existing);
                    return Err(err);
                }
                existing
            }
            None => Box::new(build()?),
        };
        Ok(&mut **self.dynamic.insert(child))
    }

    /// Child selected for one request segment.
    ///
    /// Precedence: static child, regex child (if the pattern matches), param
    /// child, then wildcard. See [`absorbs_rest`](Self::absorbs_rest) for
    /// what happens when none of them matches.
    pub(crate) fn child_of(&self, segment: &str) -> Option<&Node<T>> {
        if let Some(child) = self.children.get(segment) {
            return Some(child);
        }
        if let Some(dynamic) = self.dynamic.as_deref() {
            match &dynamic.kind {
                NodeKind::Regex { pattern, .. } => {
                    if pattern.is_match(segment) {
                        return Some(dynamic);
                    }
                }
                NodeKind::Param { .. } | NodeKind::Wildcard => return Some(dynamic),
                NodeKind::Root | NodeKind::Static => {}
            }
        }
        None
    }
}
