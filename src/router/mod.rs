//! # Router Module
//!
//! The router maps `(method, path)` to a registered value using one segment
//! trie per HTTP method.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Building the per-method tries at registration time
//! - Rejecting conflicting or duplicate registrations
//! - Matching request paths to the most specific registered route
//! - Capturing path parameters along the matched path
//!
//! ## Segment Kinds
//!
//! | Pattern          | Kind     | Matches                                   |
//! |------------------|----------|-------------------------------------------|
//! | `detail`         | static   | the literal segment                       |
//! | `:id([0-9]+)`    | regex    | a segment satisfying the pattern          |
//! | `:id`            | param    | any single segment                        |
//! | `*`              | wildcard | one segment; all remaining when trailing  |
//!
//! At each position the lookup tries static, then regex, then param, then
//! wildcard. Only one of the three dynamic kinds may be registered at a
//! position. There is no backtracking, so `/a/*/c` matches `/a/b/c` but not
//! `/a/b1/b2/c`, while `/a/b/*` matches `/a/b/c/d`.
//!
//! ## Example
//!
//! ```rust
//! use http::Method;
//! use webtrie::router::Router;
//!
//! # fn main() -> Result<(), webtrie::router::RouteError> {
//! let mut router = Router::new();
//! router.add_route(Method::GET, "/gm/:id([0-9a-zA-Z]+)", "get_gm")?;
//!
//! let matched = router.find_route(&Method::GET, "/gm/abc123").unwrap();
//! assert_eq!(*matched.value, "get_gm");
//! assert_eq!(matched.get_path_param("id"), Some("abc123"));
//! assert!(router.find_route(&Method::GET, "/gm/!!!").is_none());
//! # Ok(())
//! # }
//! ```

mod core;
mod error;
mod node;
#[cfg(test)]
mod tests;

pub use core::{ParamVec, RouteMatch, Router, MAX_INLINE_PARAMS};
pub use error::RouteError;
pub use node::{Node, NodeKind};
