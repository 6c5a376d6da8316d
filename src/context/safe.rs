//! Lock-protected view of the staged response for multi-threaded handlers.

use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::error::ContextError;
use super::value::StringValue;

struct Staged<'c> {
    status: &'c mut Option<StatusCode>,
    headers: &'c mut HeaderMap,
    body: &'c mut Vec<u8>,
}

/// Thread-synchronized view of a [`Context`](super::Context).
///
/// Obtained from [`Context::safe`](super::Context::safe). Every write to the
/// staged status, headers and body takes one mutex, so the view can be
/// shared by reference with `std::thread::scope` workers of the same
/// request. Path parameters and the matched route are read-only here.
///
/// ```rust
/// # use webtrie::context::Context;
/// # use webtrie::server::RecordingSink;
/// # let mut sink = RecordingSink::new();
/// # let mut ctx = Context::new(http::Request::new(Vec::new()), &mut sink);
/// let safe = ctx.safe();
/// std::thread::scope(|s| {
///     for part in ["a", "b", "c"] {
///         let safe = &safe;
///         s.spawn(move || safe.append_body(part.as_bytes()));
///     }
/// });
/// assert_eq!(safe.body_len(), 3);
/// ```
pub struct SafeContext<'c> {
    staged: Mutex<Staged<'c>>,
    path_params: &'c HashMap<String, String>,
    matched_route: &'c str,
}

impl<'c> SafeContext<'c> {
    pub(super) fn new(
        status: &'c mut Option<StatusCode>,
        headers: &'c mut HeaderMap,
        body: &'c mut Vec<u8>,
        path_params: &'c HashMap<String, String>,
        matched_route: &'c str,
    ) -> Self {
        Self {
            staged: Mutex::new(Staged {
                status,
                headers,
                body,
            }),
            path_params,
            matched_route,
        }
    }

    // A worker that panicked mid-write leaves plain data behind, so the
    // poisoned guard is still usable.
    fn lock(&self) -> MutexGuard<'_, Staged<'c>> {
        self.staged.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stage `val` as JSON with `status` in one critical section.
    ///
    /// # Errors
    ///
    /// [`ContextError::Json`] if `val` cannot be serialized.
    pub fn resp_json<T: Serialize + ?Sized>(
        &self,
        status: StatusCode,
        val: &T,
    ) -> Result<(), ContextError> {
        let data = serde_json::to_vec(val)?;
        let mut staged = self.lock();
        staged
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        *staged.status = Some(status);
        *staged.body = data;
        Ok(())
    }

    pub fn set_status(&self, status: StatusCode) {
        *self.lock().status = Some(status);
    }

    pub fn status(&self) -> Option<StatusCode> {
        *self.lock().status
    }

    pub fn set_header(&self, name: HeaderName, value: HeaderValue) {
        self.lock().headers.insert(name, value);
    }

    pub fn set_body(&self, body: Vec<u8>) {
        *self.lock().body = body;
    }

    pub fn append_body(&self, chunk: &[u8]) {
        self.lock().body.extend_from_slice(chunk);
    }

    pub fn body_len(&self) -> usize {
        self.lock().body.len()
    }

    pub fn path_value(&self, key: &str) -> StringValue {
        match self.path_params.get(key) {
            Some(val) => StringValue::new(key, val.as_str()),
            None => StringValue::missing("path", key),
        }
    }

    pub fn matched_route(&self) -> &str {
        self.matched_route
    }
}
