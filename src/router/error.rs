use http::Method;
use std::fmt;

/// Route registration error
///
/// Returned by [`Router::add_route`](super::Router::add_route) when a route
/// cannot be inserted into the trie. These describe a misconfigured route
/// table; callers are expected to abort startup rather than serve traffic.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteError {
    /// The registration path was the empty string
    EmptyPath,
    /// A `:` segment had no parameter name (e.g. `/user/:`)
    EmptyParamName {
        /// The offending segment
        segment: String,
    },
    /// The pattern embedded in a `:name(pattern)` segment failed to compile
    InvalidRegex {
        /// The offending segment
        segment: String,
        /// Compiler error from the `regex` crate
        source: regex::Error,
    },
    /// A parameter with a different name is already registered at this position
    ParamConflict {
        /// Segment already in the trie
        existing: String,
        /// Segment that was being registered
        new: String,
    },
    /// A regex parameter with a different name or pattern is already registered here
    RegexConflict {
        /// Segment already in the trie
        existing: String,
        /// Segment that was being registered
        new: String,
    },
    /// Two different dynamic kinds (param, regex, wildcard) at one position
    MixedDynamic {
        /// Kind already registered at this position
        existing: &'static str,
        /// Kind that was being registered
        new: &'static str,
        /// Segment that was being registered
        segment: String,
    },
    /// The exact (method, path) pair is already registered
    Duplicate {
        /// HTTP method of the route
        method: Method,
        /// Registration path of the route
        path: String,
    },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::EmptyPath => write!(f, "route registration error: path must not be empty"),
            RouteError::EmptyParamName { segment } => {
                write!(
                    f,
                    "route registration error: parameter segment '{segment}' has no name"
                )
            }
            RouteError::InvalidRegex { segment, source } => {
                write!(
                    f,
                    "route registration error: invalid regex in segment '{segment}': {source}"
                )
            }
            RouteError::ParamConflict { existing, new } => {
                write!(
                    f,
                    "route conflict: path parameter '{existing}' already registered at this position, \
                    cannot register '{new}'"
                )
            }
            RouteError::RegexConflict { existing, new } => {
                write!(
                    f,
                    "route conflict: regex parameter '{existing}' already registered at this position, \
                    cannot register '{new}'"
                )
            }
            RouteError::MixedDynamic {
                existing,
                new,
                segment,
            } => {
                write!(
                    f,
                    "illegal route: {existing} segment already registered at this position, \
                    cannot register {new} segment '{segment}'"
                )
            }
            RouteError::Duplicate { method, path } => {
                write!(f, "route conflict: {method} {path} is already registered")
            }
        }
    }
}

impl std::error::Error for RouteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RouteError::InvalidRegex { source, .. } => Some(source),
            _ => None,
        }
    }
}
