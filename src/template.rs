//! # Template Module
//!
//! Rendering is an external collaborator of the request pipeline: a
//! [`Context`](crate::context::Context) hands a template name and a data value
//! to whatever [`TemplateEngine`] the server was configured with and stages the
//! returned bytes as the response body.
//!
//! [`MiniJinjaEngine`] is the bundled implementation. Templates can be added
//! from strings or loaded lazily from a directory.
//!
//! ```rust
//! use serde_json::json;
//! use webtrie::template::{MiniJinjaEngine, TemplateEngine};
//!
//! # fn main() -> Result<(), webtrie::template::TemplateError> {
//! let mut engine = MiniJinjaEngine::new();
//! engine.add_template("login.gohtml", "<h1>Hello {{ name }}</h1>")?;
//! let page = engine.render("login.gohtml", &json!({ "name": "World" }))?;
//! assert_eq!(page, b"<h1>Hello World</h1>");
//! # Ok(())
//! # }
//! ```

use minijinja::{Environment, ErrorKind};
use serde_json::Value as JsonValue;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Error raised while rendering a template
#[derive(Debug)]
pub enum TemplateError {
    /// No template is registered under the requested name
    NotFound {
        /// Requested template name
        name: String,
    },
    /// The template failed to parse or evaluate
    Render {
        /// Template name
        name: String,
        /// Engine-specific failure
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// The render data could not be converted into a template value
    Data(serde_json::Error),
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::NotFound { name } => write!(f, "template '{name}' not found"),
            TemplateError::Render { name, source } => {
                write!(f, "failed to render template '{name}': {source}")
            }
            TemplateError::Data(err) => write!(f, "invalid template data: {err}"),
        }
    }
}

impl std::error::Error for TemplateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TemplateError::NotFound { .. } => None,
            TemplateError::Render { source, .. } => Some(source.as_ref()),
            TemplateError::Data(err) => Some(err),
        }
    }
}

/// Renders a named template with a data value.
///
/// Implementations are shared across every in-flight request, so they must
/// be `Send + Sync` and rendering takes `&self`.
pub trait TemplateEngine: Send + Sync {
    /// Render `name` with `data`, returning the output bytes.
    fn render(&self, name: &str, data: &JsonValue) -> Result<Vec<u8>, TemplateError>;
}

/// [`TemplateEngine`] backed by a `minijinja` environment.
pub struct MiniJinjaEngine {
    env: Environment<'static>,
}

impl Default for MiniJinjaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MiniJinjaEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiniJinjaEngine").finish_non_exhaustive()
    }
}

impl MiniJinjaEngine {
    /// Engine with no templates.
    #[must_use]
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
        }
    }

    /// Engine that loads templates on demand from `dir`.
    ///
    /// Template names are paths relative to `dir` (`"user/profile.html"`).
    /// Names that try to escape the directory are treated as not found.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        debug!(dir = %dir.display(), "Template directory configured");
        let mut env = Environment::new();
        env.set_loader(minijinja::path_loader(dir));
        Self { env }
    }

    /// Register a template from source.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Render`] if the source does not parse.
    pub fn add_template(
        &mut self,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<(), TemplateError> {
        let name = name.into();
        self.env
            .add_template_owned(name.clone(), source.into())
            .map_err(|e| render_error(&name, e))
    }

    /// Access the underlying environment, e.g. to add filters or globals.
    pub fn environment_mut(&mut self) -> &mut Environment<'static> {
        &mut self.env
    }
}

fn render_error(name: &str, err: minijinja::Error) -> TemplateError {
    if err.kind() == ErrorKind::TemplateNotFound {
        TemplateError::NotFound {
            name: name.to_string(),
        }
    } else {
        TemplateError::Render {
            name: name.to_string(),
            source: Box::new(err),
        }
    }
}

impl TemplateEngine for MiniJinjaEngine {
    fn render(&self, name: &str, data: &JsonValue) -> Result<Vec<u8>, TemplateError> {
        let tmpl = self
            .env
            .get_template(name)
            .map_err(|e| render_error(name, e))?;
        let rendered = tmpl.render(data).map_err(|e| render_error(name, e))?;
        Ok(rendered.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_registered_template() {
        let mut engine = MiniJinjaEngine::new();
        engine
            .add_template("hello", "Hello {{ name }}!")
            .unwrap();
        let out = engine.render("hello", &json!({ "name": "World" })).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Hello World!");
    }

    #[test]
    fn test_unknown_template_is_not_found() {
        let engine = MiniJinjaEngine::new();
        let err = engine.render("missing", &json!({})).unwrap_err();
        assert!(matches!(err, TemplateError::NotFound { ref name } if name == "missing"));
    }

    #[test]
    fn test_syntax_error_on_add() {
        let mut engine = MiniJinjaEngine::new();
        let err = engine.add_template("broken", "{% if %}").unwrap_err();
        assert!(matches!(err, TemplateError::Render { .. }));
        assert!(err.to_string().contains("broken"));
    }
}
