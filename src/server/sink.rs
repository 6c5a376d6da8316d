//! The transport seam a flushed response is written to.

use http::{HeaderMap, Response, StatusCode};
use std::io;

/// Destination for a flushed response.
///
/// [`Context::flush`](crate::context::Context::flush) calls `write_head`
/// once and then `write_body` once.
pub trait ResponseSink {
    /// Write the status line and headers.
    fn write_head(&mut self, status: StatusCode, headers: &HeaderMap) -> io::Result<()>;

    /// Write the body, returning how many bytes were accepted.
    fn write_body(&mut self, body: &[u8]) -> io::Result<usize>;
}

/// In-memory [`ResponseSink`] that keeps what was written.
///
/// Useful for embedding the pipeline behind another transport and for tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
    head_writes: usize,
    fail_writes: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every write fails with `BrokenPipe`.
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    /// Status written by the last flush, `None` if nothing was written.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of a written header.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as UTF-8, lossy.
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// How many times a status line was written.
    pub fn head_writes(&self) -> usize {
        self.head_writes
    }

    /// Convert the recording into an `http::Response`.
    ///
    /// Returns `None` if no response was written.
    pub fn into_response(self) -> Option<Response<Vec<u8>>> {
        let status = self.status?;
        let mut response = Response::new(self.body);
        *response.status_mut() = status;
        *response.headers_mut() = self.headers;
        Some(response)
    }
}

impl ResponseSink for RecordingSink {
    fn write_head(&mut self, status: StatusCode, headers: &HeaderMap) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"));
        }
        self.head_writes += 1;
        self.status = Some(status);
        self.headers.clone_from(headers);
        Ok(())
    }

    fn write_body(&mut self, body: &[u8]) -> io::Result<usize> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"));
        }
        self.body.extend_from_slice(body);
        Ok(body.len())
    }
}
