use std::fmt;

use crate::template::TemplateError;

/// Request-time error reported by [`Context`](super::Context) accessors.
///
/// None of these are fatal: handlers decide how to respond, typically by
/// staging a 4xx or 5xx status.
#[derive(Debug)]
pub enum ContextError {
    /// The key is absent from the query string, form or path parameters
    KeyNotFound {
        /// Where the lookup happened (`"query"`, `"form"` or `"path"`)
        location: &'static str,
        /// Requested key
        key: String,
    },
    /// The value exists but cannot be converted to the requested type
    InvalidValue {
        /// Looked-up key
        key: String,
        /// Raw value
        value: String,
        /// Conversion failure
        reason: String,
    },
    /// The request has no body to decode
    MissingBody,
    /// JSON encoding or decoding failed
    Json(serde_json::Error),
    /// The template engine failed to render
    Template(TemplateError),
    /// `render` was called on a server without a template engine
    NoTemplateEngine,
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextError::KeyNotFound { location, key } => {
                write!(f, "{location} key '{key}' not found")
            }
            ContextError::InvalidValue { key, value, reason } => {
                write!(f, "invalid value '{value}' for key '{key}': {reason}")
            }
            ContextError::MissingBody => write!(f, "request body is empty"),
            ContextError::Json(err) => write!(f, "json error: {err}"),
            ContextError::Template(err) => write!(f, "{err}"),
            ContextError::NoTemplateEngine => write!(f, "no template engine configured"),
        }
    }
}

impl std::error::Error for ContextError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ContextError::Json(err) => Some(err),
            ContextError::Template(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ContextError {
    fn from(err: serde_json::Error) -> Self {
        ContextError::Json(err)
    }
}

impl From<TemplateError> for ContextError {
    fn from(err: TemplateError) -> Self {
        ContextError::Template(err)
    }
}
