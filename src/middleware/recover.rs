use http::StatusCode;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::error;

use super::{handler, middleware, HandleFunc, Middleware};
use crate::context::Context;

type PanicLogFunc = Arc<dyn Fn(&Context<'_>, &str) + Send + Sync>;

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        format!("{payload:?}")
    }
}

/// Builds the panic-recovery middleware.
///
/// A panic anywhere inside the wrapped chain is caught, the configured
/// status and body are staged, and the context is flushed unless the inner
/// flush layer already wrote the response. Register it first so it wraps
/// every other layer.
#[derive(Clone)]
pub struct RecoverBuilder {
    status: StatusCode,
    body: Vec<u8>,
    log_func: PanicLogFunc,
}

impl Default for RecoverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RecoverBuilder {
    /// `500 Internal Server Error`, logged with `tracing::error!`.
    pub fn new() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: b"Internal Server Error".to_vec(),
            log_func: Arc::new(|ctx, message| {
                error!(
                    request_id = %ctx.request_id(),
                    method = %ctx.method(),
                    uri = %ctx.request().uri(),
                    panic_message = %message,
                    "Handler panicked"
                );
            }),
        }
    }

    #[must_use]
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Replace the panic logger. It receives the context after the error
    /// response has been staged.
    #[must_use]
    pub fn log_func<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context<'_>, &str) + Send + Sync + 'static,
    {
        self.log_func = Arc::new(f);
        self
    }

    pub fn build(self) -> Middleware {
        let config = Arc::new(self);
        middleware(move |next: HandleFunc| {
            let config = Arc::clone(&config);
            handler(move |ctx| {
                let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| next(ctx))) else {
                    return;
                };
                let message = panic_message(payload.as_ref());
                ctx.resp_status = Some(config.status);
                ctx.resp_body.clone_from(&config.body);
                (config.log_func)(&*ctx, &message);
                if !ctx.is_flushed() {
                    if let Err(err) = ctx.flush() {
                        error!(error = %err, "Failed to write recovery response");
                    }
                }
            })
        })
    }
}
