use dashmap::DashMap;
use http::StatusCode;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{handler, middleware, HandleFunc, Middleware};

/// Label used for requests that matched no route.
pub const UNKNOWN_ROUTE: &str = "unknown";

/// Method label for anything outside the standard HTTP methods.
pub const OTHER_METHOD: &str = "OTHER";

/// Bounded method label; extension methods collapse to [`OTHER_METHOD`].
fn method_label(method: &str) -> &'static str {
    match method {
        "GET" => "GET",
        "POST" => "POST",
        "PUT" => "PUT",
        "DELETE" => "DELETE",
        "PATCH" => "PATCH",
        "HEAD" => "HEAD",
        "OPTIONS" => "OPTIONS",
        "CONNECT" => "CONNECT",
        "TRACE" => "TRACE",
        _ => OTHER_METHOD,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct RouteKey {
    pattern: String,
    method: &'static str,
    status: u16,
}

#[derive(Debug, Default, Clone, Copy)]
struct RouteStats {
    count: u64,
    latency_ns: u64,
}

/// Middleware for collecting Prometheus-compatible metrics
///
/// Global counters are atomics updated with `Relaxed` ordering. Per-route
/// counters are keyed by `(pattern, method, status)`, where `pattern` is the
/// matched registration path or `unknown` for a miss, and extension methods
/// share the `OTHER` label.
///
/// ```rust
/// use std::sync::Arc;
/// use webtrie::middleware::MetricsMiddleware;
///
/// let metrics = Arc::new(MetricsMiddleware::new());
/// let layer = metrics.layer();
/// # let _ = layer;
/// assert_eq!(metrics.request_count(), 0);
/// ```
#[derive(Debug, Default)]
pub struct MetricsMiddleware {
    request_count: AtomicUsize,
    total_latency_ns: AtomicU64,
    stack_size: AtomicUsize,
    by_route: DashMap<RouteKey, RouteStats>,
}

impl MetricsMiddleware {
    /// Create a new metrics middleware with all counters initialized to zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Middleware that records into this collector.
    pub fn layer(self: &Arc<Self>) -> Middleware {
        let metrics = Arc::clone(self);
        middleware(move |next: HandleFunc| {
            let metrics = Arc::clone(&metrics);
            handler(move |ctx| {
                let start = Instant::now();
                next(ctx);
                let pattern = if ctx.matched_route.is_empty() {
                    UNKNOWN_ROUTE
                } else {
                    ctx.matched_route.as_str()
                };
                let status = ctx.resp_status.unwrap_or(StatusCode::OK);
                metrics.record(pattern, ctx.method().as_str(), status, start.elapsed());
            })
        })
    }

    /// Record one finished request.
    pub fn record(&self, pattern: &str, method: &str, status: StatusCode, latency: Duration) {
        let latency_ns = u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX);
        self.request_count.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ns
            .fetch_add(latency_ns, Ordering::Relaxed);
        let key = RouteKey {
            pattern: pattern.to_string(),
            method: method_label(method),
            status: status.as_u16(),
        };
        let mut stats = self.by_route.entry(key).or_default();
        stats.count += 1;
        stats.latency_ns = stats.latency_ns.saturating_add(latency_ns);
        drop(stats);

        let stack_size = if may::coroutine::is_coroutine() {
            may::coroutine::current().stack_size()
        } else {
            may::config().get_stack_size()
        };
        self.stack_size.store(stack_size, Ordering::Relaxed);
    }

    /// Get the total number of requests processed
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Mean latency across all requests, zero before the first one.
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    /// Requests seen for one `(pattern, method, status)` label set.
    pub fn route_count(&self, pattern: &str, method: &str, status: StatusCode) -> u64 {
        let key = RouteKey {
            pattern: pattern.to_string(),
            method: method_label(method),
            status: status.as_u16(),
        };
        self.by_route.get(&key).map_or(0, |stats| stats.count)
    }

    /// Prometheus text exposition of every counter.
    pub fn render_prometheus(&self) -> String {
        let mut out = format!(
            "# HELP webtrie_requests_total Total number of handled requests\n\
             # TYPE webtrie_requests_total counter\n\
             webtrie_requests_total {}\n\
             # HELP webtrie_request_latency_seconds Average request latency in seconds\n\
             # TYPE webtrie_request_latency_seconds gauge\n\
             webtrie_request_latency_seconds {}\n\
             # HELP webtrie_coroutine_stack_bytes Configured coroutine stack size\n\
             # TYPE webtrie_coroutine_stack_bytes gauge\n\
             webtrie_coroutine_stack_bytes {}\n",
            self.request_count(),
            self.average_latency().as_secs_f64(),
            self.stack_size.load(Ordering::Relaxed),
        );

        let mut rows: Vec<(RouteKey, RouteStats)> = self
            .by_route
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));

        out.push_str(
            "# HELP webtrie_http_request_duration_seconds Request latency by route\n\
             # TYPE webtrie_http_request_duration_seconds summary\n",
        );
        for (key, stats) in &rows {
            let labels = format!(
                "pattern=\"{}\",method=\"{}\",status=\"{}\"",
                escape_label(&key.pattern),
                key.method,
                key.status
            );
            out.push_str(&format!(
                "webtrie_http_request_duration_seconds_sum{{{labels}}} {}\n\
                 webtrie_http_request_duration_seconds_count{{{labels}}} {}\n",
                Duration::from_nanos(stats.latency_ns).as_secs_f64(),
                stats.count
            ));
        }
        out
    }
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
