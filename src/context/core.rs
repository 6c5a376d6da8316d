//! Context core module - per-request state threaded through the pipeline.

use cookie::Cookie;
use http::header::{CONTENT_TYPE, SET_COOKIE};
use http::{HeaderMap, HeaderValue, Method, Request, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::{Cell, OnceCell};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::Arc;

use super::error::ContextError;
use super::safe::SafeContext;
use super::value::StringValue;
use crate::ids::RequestId;
use crate::server::ResponseSink;
use crate::template::TemplateEngine;

type FormValues = HashMap<String, Vec<String>>;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

fn parse_urlencoded(input: &[u8], into: &mut FormValues) {
    for (k, v) in url::form_urlencoded::parse(input) {
        into.entry(k.into_owned()).or_default().push(v.into_owned());
    }
}

/// Mutable state for one request.
///
/// Handlers and middleware read the request through accessors and stage the
/// response in the public `resp_*` fields. Nothing reaches the transport
/// until [`flush`](Self::flush) runs, which the server does once, right after
/// the route handler returns.
pub struct Context<'a> {
    request: Request<Vec<u8>>,
    sink: &'a mut dyn ResponseSink,
    request_id: RequestId,
    template_engine: Option<Arc<dyn TemplateEngine>>,
    /// Path parameters of the matched route
    pub path_params: HashMap<String, String>,
    /// Registration path of the matched route, empty on a miss
    pub matched_route: String,
    /// Staged status; `None` is written as `200 OK`
    pub resp_status: Option<StatusCode>,
    /// Staged response headers
    pub resp_headers: HeaderMap,
    /// Staged response body
    pub resp_body: Vec<u8>,
    query_values: OnceCell<FormValues>,
    form_values: OnceCell<FormValues>,
    query_parses: Cell<usize>,
    flushed: bool,
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("method", self.request.method())
            .field("uri", self.request.uri())
            .field("request_id", &self.request_id)
            .field("matched_route", &self.matched_route)
            .field("resp_status", &self.resp_status)
            .field("flushed", &self.flushed)
            .finish_non_exhaustive()
    }
}

impl<'a> Context<'a> {
    /// Build a context for `request` that will write to `sink`.
    pub fn new(request: Request<Vec<u8>>, sink: &'a mut dyn ResponseSink) -> Self {
        let request_id = RequestId::for_request(&request);
        Self {
            request,
            sink,
            request_id,
            template_engine: None,
            path_params: HashMap::new(),
            matched_route: String::new(),
            resp_status: None,
            resp_headers: HeaderMap::new(),
            resp_body: Vec::new(),
            query_values: OnceCell::new(),
            form_values: OnceCell::new(),
            query_parses: Cell::new(0),
            flushed: false,
        }
    }

    /// Attach the engine used by [`render`](Self::render).
    #[must_use]
    pub fn with_template_engine(mut self, engine: Option<Arc<dyn TemplateEngine>>) -> Self {
        self.template_engine = engine;
        self
    }

    pub fn request(&self) -> &Request<Vec<u8>> {
        &self.request
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    /// Request path without the query string.
    pub fn path(&self) -> &str {
        self.request.uri().path()
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// First value of a request header, if it is valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        self.request.body()
    }

    fn query_map(&self) -> &FormValues {
        self.query_values.get_or_init(|| {
            self.query_parses.set(self.query_parses.get() + 1);
            let mut values = FormValues::new();
            if let Some(query) = self.request.uri().query() {
                parse_urlencoded(query.as_bytes(), &mut values);
            }
            values
        })
    }

    /// How many times this request's query string has been parsed (0 or 1).
    #[doc(hidden)]
    pub fn query_parse_count(&self) -> usize {
        self.query_parses.get()
    }

    /// First query-string value for `key`.
    ///
    /// The query string is parsed on first use and cached for the rest of
    /// the request. A key present with an empty value (`?k=`) is found.
    pub fn query_value(&self, key: &str) -> StringValue {
        match self.query_map().get(key).and_then(|vals| vals.first()) {
            Some(val) => StringValue::new(key, val.as_str()),
            None => StringValue::missing("query", key),
        }
    }

    /// Every query-string value for `key`, in order.
    pub fn query_values(&self, key: &str) -> Vec<String> {
        self.query_map().get(key).cloned().unwrap_or_default()
    }

    fn form_map(&self) -> &FormValues {
        self.form_values.get_or_init(|| {
            let mut values = FormValues::new();
            let has_form_body = matches!(
                *self.request.method(),
                Method::POST | Method::PUT | Method::PATCH
            ) && self
                .header(CONTENT_TYPE.as_str())
                .and_then(|ct| ct.split(';').next())
                .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_URLENCODED));
            if has_form_body {
                parse_urlencoded(self.request.body(), &mut values);
            }
            for (k, vals) in self.query_map() {
                values
                    .entry(k.clone())
                    .or_default()
                    .extend(vals.iter().cloned());
            }
            values
        })
    }

    /// First form value for `key`.
    ///
    /// Urlencoded bodies of POST, PUT and PATCH requests take precedence over
    /// the query string.
    pub fn form_value(&self, key: &str) -> StringValue {
        match self.form_map().get(key).and_then(|vals| vals.first()) {
            Some(val) => StringValue::new(key, val.as_str()),
            None => StringValue::missing("form", key),
        }
    }

    /// Path parameter captured by the router.
    pub fn path_value(&self, key: &str) -> StringValue {
        match self.path_params.get(key) {
            Some(val) => StringValue::new(key, val.as_str()),
            None => StringValue::missing("path", key),
        }
    }

    /// Decode the JSON request body.
    ///
    /// # Errors
    ///
    /// [`ContextError::MissingBody`] for an empty body,
    /// [`ContextError::Json`] for malformed or mismatched JSON.
    pub fn bind_json<T: DeserializeOwned>(&self) -> Result<T, ContextError> {
        if self.request.body().is_empty() {
            return Err(ContextError::MissingBody);
        }
        Ok(serde_json::from_slice(self.request.body())?)
    }

    /// Stage `val` as a JSON response with `status`.
    ///
    /// # Errors
    ///
    /// [`ContextError::Json`] if `val` cannot be serialized; nothing is
    /// staged in that case.
    pub fn resp_json<T: Serialize + ?Sized>(
        &mut self,
        status: StatusCode,
        val: &T,
    ) -> Result<(), ContextError> {
        let data = serde_json::to_vec(val)?;
        self.resp_headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.resp_status = Some(status);
        self.resp_body = data;
        Ok(())
    }

    /// Stage `val` as a `200 OK` JSON response.
    ///
    /// # Errors
    ///
    /// See [`resp_json`](Self::resp_json).
    pub fn resp_json_ok<T: Serialize + ?Sized>(&mut self, val: &T) -> Result<(), ContextError> {
        self.resp_json(StatusCode::OK, val)
    }

    /// Stage a `Set-Cookie` header.
    ///
    /// # Errors
    ///
    /// [`ContextError::InvalidValue`] if the cookie does not form a valid
    /// header value.
    pub fn set_cookie(&mut self, cookie: &Cookie<'_>) -> Result<(), ContextError> {
        let line = cookie.to_string();
        let value = HeaderValue::from_str(&line).map_err(|e| ContextError::InvalidValue {
            key: cookie.name().to_string(),
            value: line.clone(),
            reason: e.to_string(),
        })?;
        self.resp_headers.append(SET_COOKIE, value);
        Ok(())
    }

    /// Render `name` with `data` into the staged body.
    ///
    /// # Errors
    ///
    /// [`ContextError::NoTemplateEngine`] when the server has no engine.
    /// A render failure stages `500` and returns [`ContextError::Template`].
    pub fn render<T: Serialize + ?Sized>(&mut self, name: &str, data: &T) -> Result<(), ContextError> {
        let Some(engine) = self.template_engine.as_ref() else {
            return Err(ContextError::NoTemplateEngine);
        };
        let data = serde_json::to_value(data)?;
        match engine.render(name, &data) {
            Ok(bytes) => {
                self.resp_body = bytes;
                Ok(())
            }
            Err(err) => {
                self.resp_status = Some(StatusCode::INTERNAL_SERVER_ERROR);
                Err(err.into())
            }
        }
    }

    /// Write the staged status, headers and body to the transport.
    ///
    /// Only the first call writes; later calls return `Ok(())` untouched.
    ///
    /// # Errors
    ///
    /// Propagates sink failures, and reports a short body write as
    /// [`io::ErrorKind::WriteZero`].
    pub fn flush(&mut self) -> io::Result<()> {
        if self.flushed {
            return Ok(());
        }
        self.flushed = true;
        let status = self.resp_status.unwrap_or(StatusCode::OK);
        self.sink.write_head(status, &self.resp_headers)?;
        let written = self.sink.write_body(&self.resp_body)?;
        if written != self.resp_body.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!(
                    "short response write: {written} of {} bytes",
                    self.resp_body.len()
                ),
            ));
        }
        Ok(())
    }

    /// Whether [`flush`](Self::flush) already ran.
    pub fn is_flushed(&self) -> bool {
        self.flushed
    }

    /// Lock-protected view of the staged response for handlers that fan out
    /// to scoped threads.
    pub fn safe(&mut self) -> SafeContext<'_> {
        SafeContext::new(
            &mut self.resp_status,
            &mut self.resp_headers,
            &mut self.resp_body,
            &self.path_params,
            &self.matched_route,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::RecordingSink;

    fn get(uri: &str) -> Request<Vec<u8>> {
        Request::builder().uri(uri).body(Vec::new()).unwrap()
    }

    #[test]
    fn test_query_parsed_once() {
        let mut sink = RecordingSink::new();
        let ctx = Context::new(get("/?k=v&k=w&n=3"), &mut sink);
        assert_eq!(ctx.query_parse_count(), 0);
        assert_eq!(ctx.query_value("k").into_string().unwrap(), "v");
        assert_eq!(ctx.query_value("n").to_i64().unwrap(), 3);
        assert_eq!(ctx.query_values("k"), vec!["v", "w"]);
        assert_eq!(ctx.query_parse_count(), 1);
    }

    #[test]
    fn test_missing_query_key() {
        let mut sink = RecordingSink::new();
        let ctx = Context::new(get("/list"), &mut sink);
        assert!(matches!(
            ctx.query_value("page").to_i64(),
            Err(ContextError::KeyNotFound { location: "query", .. })
        ));
        assert!(ctx.query_values("page").is_empty());
    }

    #[test]
    fn test_empty_query_value_is_found() {
        let mut sink = RecordingSink::new();
        let ctx = Context::new(get("/?k="), &mut sink);
        assert_eq!(ctx.query_value("k").into_string().unwrap(), "");
    }

    #[test]
    fn test_flush_writes_once() {
        let mut sink = RecordingSink::new();
        {
            let mut ctx = Context::new(get("/"), &mut sink);
            ctx.resp_body = b"hello".to_vec();
            ctx.flush().unwrap();
            ctx.resp_body = b"late".to_vec();
            ctx.flush().unwrap();
            assert!(ctx.is_flushed());
        }
        assert_eq!(sink.status(), Some(StatusCode::OK));
        assert_eq!(sink.body(), b"hello");
        assert_eq!(sink.head_writes(), 1);
    }

    #[test]
    fn test_render_without_engine() {
        let mut sink = RecordingSink::new();
        let mut ctx = Context::new(get("/"), &mut sink);
        assert!(matches!(
            ctx.render("index", &()),
            Err(ContextError::NoTemplateEngine)
        ));
    }
}
