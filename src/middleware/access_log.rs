use http::header::HOST;
use http::StatusCode;
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{info, warn};

use super::{handler, middleware, HandleFunc, Middleware};
use crate::context::Context;

type LogFunc = Arc<dyn Fn(&str) + Send + Sync>;

/// One access-log record, serialized as a JSON line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessLog {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub host: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub route: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub http_method: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub path: String,
    pub resp_status_code: u16,
    pub resp_data: String,
}

impl AccessLog {
    /// Snapshot the request and the staged response.
    pub fn from_context(ctx: &Context<'_>) -> Self {
        let host = ctx
            .header(HOST.as_str())
            .map(str::to_string)
            .or_else(|| ctx.request().uri().authority().map(|a| a.to_string()))
            .unwrap_or_default();
        Self {
            host,
            route: ctx.matched_route.clone(),
            http_method: ctx.method().to_string(),
            path: ctx.path().to_string(),
            resp_status_code: ctx.resp_status.unwrap_or(StatusCode::OK).as_u16(),
            resp_data: String::from_utf8_lossy(&ctx.resp_body).into_owned(),
        }
    }
}

/// Builds the access-log middleware.
///
/// The record is emitted after the wrapped handler returns, and also when
/// it panics (the panic is then resumed for an outer recovery layer).
///
/// ```rust
/// use webtrie::middleware::AccessLogBuilder;
///
/// let layer = AccessLogBuilder::new()
///     .log_func(|line| eprintln!("{line}"))
///     .build();
/// # let _ = layer;
/// ```
#[derive(Clone)]
pub struct AccessLogBuilder {
    log_func: LogFunc,
}

impl Default for AccessLogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessLogBuilder {
    /// Log through `tracing` at info level, target `webtrie::access_log`.
    pub fn new() -> Self {
        Self {
            log_func: Arc::new(|line| info!(target: "webtrie::access_log", "{line}")),
        }
    }

    /// Replace the sink for serialized records.
    #[must_use]
    pub fn log_func<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.log_func = Arc::new(f);
        self
    }

    pub fn build(self) -> Middleware {
        let log_func = self.log_func;
        middleware(move |next: HandleFunc| {
            let log_func = Arc::clone(&log_func);
            handler(move |ctx| {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| next(ctx)));
                match serde_json::to_string(&AccessLog::from_context(ctx)) {
                    Ok(line) => log_func(&line),
                    Err(err) => warn!(error = %err, "Failed to serialize access log"),
                }
                if let Err(payload) = outcome {
                    panic::resume_unwind(payload);
                }
            })
        })
    }
}
