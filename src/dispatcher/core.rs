//! Dispatcher core module - terminal handler and the response flush layer.

use http::header::CONTENT_TYPE;
use http::{HeaderValue, StatusCode};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::context::Context;
use crate::middleware::{handler, HandleFunc, Middleware};
use crate::router::Router;

/// Body staged for requests that match no route.
pub const NOT_FOUND_BODY: &[u8] = b"NOT FOUND";

/// Innermost handler of every chain: route lookup and handler invocation.
#[derive(Clone)]
pub struct Dispatcher {
    router: Arc<Router<HandleFunc>>,
}

impl Dispatcher {
    pub fn new(router: Arc<Router<HandleFunc>>) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &Router<HandleFunc> {
        &self.router
    }

    /// Look up the request and run the matched handler.
    ///
    /// A hit copies every captured path parameter into `ctx.path_params`
    /// (a repeated name keeps its last value) and records `matched_route`
    /// before the handler runs. A miss stages `404 NOT FOUND`.
    pub fn dispatch(&self, ctx: &mut Context<'_>) {
        let Some(matched) = self.router.find_route(ctx.method(), ctx.path()) else {
            warn!(
                request_id = %ctx.request_id(),
                method = %ctx.method(),
                path = %ctx.path(),
                "No route matched"
            );
            ctx.resp_status = Some(StatusCode::NOT_FOUND);
            ctx.resp_headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            );
            ctx.resp_body = NOT_FOUND_BODY.to_vec();
            return;
        };
        debug!(
            request_id = %ctx.request_id(),
            route = %matched.matched_route,
            params = matched.path_params.len(),
            "Route matched"
        );
        for (name, value) in matched.path_params {
            ctx.path_params.insert(name.to_string(), value);
        }
        ctx.matched_route = matched.matched_route.to_string();
        (matched.value)(ctx);
    }

    /// The dispatcher as a [`HandleFunc`].
    pub fn into_handler(self) -> HandleFunc {
        handler(move |ctx| self.dispatch(ctx))
    }
}

/// Layer that writes the staged response once the wrapped handler returns.
///
/// Write failures are logged; the client connection is left to the
/// transport.
pub fn flush_layer() -> Middleware {
    Arc::new(|next: HandleFunc| {
        handler(move |ctx| {
            next(ctx);
            if let Err(err) = ctx.flush() {
                error!(
                    request_id = %ctx.request_id(),
                    error = %err,
                    "Failed to write response"
                );
            }
        })
    })
}
