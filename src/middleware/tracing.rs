use http::StatusCode;
use std::time::Instant;

use tracing::{field, info_span};

use super::{handler, middleware, HandleFunc, Middleware};

/// Opens an `info` span named `request` around the wrapped handler.
///
/// The span carries `method`, `path` and `request_id` from the start and
/// records `route`, `status` and `latency_ms` once the handler returns.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMiddleware;

impl TracingMiddleware {
    pub fn build(self) -> Middleware {
        middleware(|next: HandleFunc| {
            handler(move |ctx| {
                let span = info_span!(
                    "request",
                    method = %ctx.method(),
                    path = %ctx.path(),
                    request_id = %ctx.request_id(),
                    route = field::Empty,
                    status = field::Empty,
                    latency_ms = field::Empty,
                );
                let start = Instant::now();
                span.in_scope(|| next(ctx));
                span.record("route", ctx.matched_route.as_str());
                span.record("status", ctx.resp_status.unwrap_or(StatusCode::OK).as_u16());
                span.record("latency_ms", start.elapsed().as_millis() as u64);
            })
        })
    }
}
