//! Conversion of `may_minihttp` requests into `http::Request<Vec<u8>>`.

use http::{HeaderName, HeaderValue, Method, Request};
use may_minihttp::Request as RawRequest;
use std::io::{self, Read};
use tracing::debug;

fn invalid(err: impl std::error::Error + Send + Sync + 'static) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err)
}

/// Build an owned request from the parsed head and the body stream.
///
/// # Errors
///
/// `InvalidData` for a method, URI or header the `http` crate rejects, or
/// any error from reading the body.
pub fn into_http_request(req: RawRequest) -> io::Result<Request<Vec<u8>>> {
    let method = Method::from_bytes(req.method().as_bytes()).map_err(invalid)?;
    let mut builder = Request::builder().method(method).uri(req.path());
    if let Some(headers) = builder.headers_mut() {
        for h in req.headers() {
            let name = HeaderName::from_bytes(h.name.as_bytes()).map_err(invalid)?;
            let value = HeaderValue::from_bytes(h.value).map_err(invalid)?;
            headers.append(name, value);
        }
    }
    let mut body = Vec::new();
    req.body().read_to_end(&mut body)?;
    let request = builder.body(body).map_err(invalid)?;
    debug!(
        method = %request.method(),
        uri = %request.uri(),
        headers_count = request.headers().len(),
        body_size_bytes = request.body().len(),
        "HTTP request parsed"
    );
    Ok(request)
}
