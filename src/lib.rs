//! # webtrie
//!
//! **webtrie** is an embeddable HTTP request router for Rust: a segment trie
//! per HTTP method, an onion-model middleware pipeline, and a per-request
//! [`Context`] that stages the response until it is flushed once. Requests are
//! served by `may_minihttp` on `may` coroutines.
//!
//! ## Architecture
//!
//! - **[`router`]** - segment trie with static, `:param`, `:param(regex)` and
//!   `*` segments; static beats dynamic and matching never backtracks
//! - **[`context`]** - request accessors, typed [`StringValue`] lookups and
//!   response staging
//! - **[`middleware`]** - [`HandleFunc`], [`Middleware`], composition and the
//!   bundled access-log, recovery, tracing and metrics layers
//! - **[`dispatcher`]** - the terminal handler and the flush layer
//! - **[`server`]** - registration, the frozen [`AppService`] and the
//!   `may_minihttp` transport
//! - **[`template`]** - the [`TemplateEngine`] seam and a minijinja engine
//! - **[`runtime_config`]** - coroutine runtime and listener settings
//! - **[`logging`]** - `tracing_subscriber` setup for binaries
//! - **[`cli`]** - the `webtrie` demo binary
//!
//! ## Request flow
//!
//! For layers `[m0, m1]` the composed chain is `m0(m1(flush(dispatch)))`:
//!
//! ```text
//! m0.pre -> m1.pre -> dispatch -> flush -> m1.post -> m0.post
//! ```
//!
//! The response reaches the client exactly once, right after the route
//! handler returns. A layer that does not call `next` short-circuits the
//! request and nothing is written unless it flushes itself.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use webtrie::{middleware::TracingMiddleware, HttpServer};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut server = HttpServer::new(vec![TracingMiddleware.build()]);
//!     server
//!         .get("/", |ctx| ctx.resp_body = b"hello".to_vec())?
//!         .get("/user/:id", |ctx| {
//!             let id = ctx.path_value("id").to_i64().unwrap_or(0);
//!             let _ = ctx.resp_json_ok(&serde_json::json!({ "id": id }));
//!         })?;
//!
//!     webtrie::runtime_config::RuntimeConfig::from_env()?.apply();
//!     server.run("127.0.0.1:8080")?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod context;
pub mod dispatcher;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod router;
pub mod runtime_config;
pub mod server;
pub mod template;

pub use context::{Context, ContextError, SafeContext, StringValue};
pub use middleware::{compose, handler, middleware, HandleFunc, Middleware};
pub use router::{RouteError, Router};
pub use server::{AppService, HttpServer, RecordingSink, ResponseSink, ServerHandle};
pub use template::{MiniJinjaEngine, TemplateEngine, TemplateError};
