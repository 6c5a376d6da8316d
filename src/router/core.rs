//! Router core module - per-method segment trie.
//!
//! Registration builds the trie one segment at a time and rejects conflicting
//! shapes. Lookup walks it without backtracking: once a child is chosen for a
//! segment, siblings are never revisited.

use http::Method;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::error::RouteError;
use super::node::{Node, NodeKind};

/// Maximum number of path segments/parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Path parameters captured during a lookup, in path order.
///
/// Names are shared with the trie (`Arc<str>`), values are per-request.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

type SegmentVec<'p> = SmallVec<[&'p str; MAX_INLINE_PARAMS]>;

/// Split a path on `/`, dropping empty segments (`/a//b` == `a/b`).
fn segments(path: &str) -> SegmentVec<'_> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Result of successfully matching a request path to a route
#[derive(Debug)]
pub struct RouteMatch<'r, T> {
    /// Value registered for the route
    pub value: &'r T,
    /// Registration path of the matched route (e.g. `/user/:id`)
    pub matched_route: &'r str,
    /// Kind of the terminal node
    pub kind: &'r NodeKind,
    /// Captures for every param/regex segment along the path
    pub path_params: ParamVec,
}

impl<T> RouteMatch<'_, T> {
    /// Get a path parameter by name
    ///
    /// Uses "last write wins" semantics: for `/user/:id/abc/:id` matched
    /// against `/user/123/abc/456`, `id` is `456`.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Collapse the captures into a map (later captures overwrite earlier ones).
    #[must_use]
    pub fn path_params_map(&self) -> HashMap<String, String> {
        self.path_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// Per-method forest of segment tries.
///
/// Populate it completely before serving: the router has no internal
/// synchronization and is read concurrently, without locks, afterwards.
#[derive(Debug, Clone)]
pub struct Router<T> {
    trees: HashMap<Method, Node<T>>,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<T> {
    /// Create an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            trees: HashMap::new(),
        }
    }

    /// Register `value` for `(method, path)`.
    ///
    /// - `path` must not be empty; a leading `/` is optional and empty
    ///   segments are ignored.
    /// - `:name` is a path parameter, `:name(regex)` a regex-constrained
    ///   parameter, `*` a wildcard. Only one of the three may exist at a
    ///   given position, and a parameter keeps one name per position.
    /// - A `*` in the middle matches exactly one segment; a trailing `*`
    ///   matches everything that remains.
    /// - The same parameter name used twice along a path resolves to the
    ///   last captured value.
    ///
    /// # Errors
    ///
    /// Returns a [`RouteError`] for an empty path, an invalid regex, a
    /// conflicting dynamic segment, or an already registered route. The trie
    /// may keep intermediate nodes created before the failing segment; those
    /// carry no value and never match.
    pub fn add_route(&mut self, method: Method, path: &str, value: T) -> Result<(), RouteError> {
        if path.is_empty() {
            return Err(RouteError::EmptyPath);
        }
        let mut node = self
            .trees
            .entry(method.clone())
            .or_insert_with(Node::root);
        for segment in segments(path) {
            node = node.child_or_create(segment)?;
        }
        if node.value.is_some() {
            return Err(RouteError::Duplicate {
                method,
                path: path.to_string(),
            });
        }
        node.value = Some(value);
        node.full_path = path.to_string();
        debug!(method = %method, path = %path, kind = node.kind.label(), "Route registered");
        Ok(())
    }

    /// Find the route serving `(method, path)`.
    ///
    /// Returns `None` when the method has no routes, the walk dead-ends, or
    /// it ends on a node without a registered value.
    #[must_use]
    pub fn find_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        if path.is_empty() {
            return None;
        }
        let mut node = self.trees.get(method)?;
        let mut path_params = ParamVec::new();
        for segment in segments(path) {
            match node.child_of(segment) {
                Some(child) => node = child,
                // Trailing wildcard: the rest of the path is its match.
                None if node.absorbs_rest() => break,
                None => return None,
            }
            if let Some(name) = node.kind.param_name() {
                path_params.push((Arc::clone(name), segment.to_string()));
            }
        }
        let value = node.value.as_ref()?;
        Some(RouteMatch {
            value,
            matched_route: &node.full_path,
            kind: &node.kind,
            path_params,
        })
    }

    /// Every registered `(method, path)`, sorted by method then path.
    #[must_use]
    pub fn routes(&self) -> Vec<(Method, String)> {
        fn collect<T>(node: &Node<T>, method: &Method, out: &mut Vec<(Method, String)>) {
            if node.value.is_some() {
                out.push((method.clone(), node.full_path.clone()));
            }
            for child in node.children.values() {
                collect(child, method, out);
            }
            if let Some(dynamic) = node.dynamic.as_deref() {
                collect(dynamic, method, out);
            }
        }

        let mut out = Vec::new();
        for (method, root) in &self.trees {
            collect(root, method, &mut out);
        }
        out.sort_by(|a, b| (a.0.as_str(), &a.1).cmp(&(b.0.as_str(), &b.1)));
        out
    }

    /// Number of registered routes across all methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes().len()
    }

    /// Whether no route has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Root node for `method`, if any route was registered for it.
    #[must_use]
    pub fn root(&self, method: &Method) -> Option<&Node<T>> {
        self.trees.get(method)
    }

    /// Log the routing table through `tracing`.
    pub fn log_routes(&self) {
        let routes = self.routes();
        let routes_summary: Vec<String> = routes
            .iter()
            .take(10)
            .map(|(method, path)| format!("{method} {path}"))
            .collect();
        info!(
            routes_count = routes.len(),
            routes_summary = ?routes_summary,
            routing_algorithm = "segment_trie",
            "Routing table loaded"
        );
        for (method, path) in &routes {
            debug!(method = %method, path = %path, "Route");
        }
    }
}
