//! # Middleware Module
//!
//! A [`Middleware`] turns a [`HandleFunc`] into another `HandleFunc`. The
//! returned handler may run code before calling the wrapped one, after it, or
//! not call it at all. Given layers `[m0, m1, .., mN]` and a terminal handler
//! `D`, [`compose`] builds `m0(m1(..mN(D)))`, so pre-phases run outer to inner
//! and post-phases inner to outer.
//!
//! The server always inserts its flush layer directly around the route
//! dispatcher. By the time any registered middleware runs its post-phase the
//! response has been written, so post-phases observe the context and must not
//! expect changes to reach the client.
//!
//! ```rust
//! use webtrie::middleware::{compose, handler, middleware, HandleFunc};
//!
//! let log = middleware(|next: HandleFunc| {
//!     handler(move |ctx| {
//!         tracing::debug!(path = %ctx.path(), "before");
//!         next(ctx);
//!         tracing::debug!(route = %ctx.matched_route, "after");
//!     })
//! });
//! let chain = compose(&[log], handler(|ctx| ctx.resp_body = b"hi".to_vec()));
//! # let _ = chain;
//! ```
//!
//! ## Bundled layers
//!
//! - [`AccessLogBuilder`]: one JSON access-log line per request
//! - [`RecoverBuilder`]: converts a handler panic into an error response
//! - [`TracingMiddleware`]: a `tracing` span per request
//! - [`MetricsMiddleware`]: request counters in Prometheus text format

use std::sync::Arc;

use crate::context::Context;

mod access_log;
mod metrics;
mod recover;
mod tracing;

pub use access_log::{AccessLog, AccessLogBuilder};
pub use metrics::MetricsMiddleware;
pub use recover::RecoverBuilder;
pub use self::tracing::TracingMiddleware;

/// A request handler: reads the context and stages the response.
pub type HandleFunc = Arc<dyn Fn(&mut Context<'_>) + Send + Sync>;

/// A layer around a [`HandleFunc`].
pub type Middleware = Arc<dyn Fn(HandleFunc) -> HandleFunc + Send + Sync>;

/// Wrap a closure as a [`HandleFunc`].
pub fn handler<F>(f: F) -> HandleFunc
where
    F: Fn(&mut Context<'_>) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a closure as a [`Middleware`].
pub fn middleware<F>(f: F) -> Middleware
where
    F: Fn(HandleFunc) -> HandleFunc + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Compose `middlewares` around `terminal`, first element outermost.
pub fn compose(middlewares: &[Middleware], terminal: HandleFunc) -> HandleFunc {
    middlewares
        .iter()
        .rev()
        .fold(terminal, |next, layer| layer(next))
}
