//! [`ResponseSink`] for `may_minihttp` responses.
//!
//! `may_minihttp` stores header lines as `&'static str`. Repeated
//! `"Name: value"` lines are leaked once and reused from a process-wide
//! [`HeaderLines`] table capped at [`MAX_INTERNED_HEADER_LINES`]; other lines
//! past the cap are dropped with a warning. `Set-Cookie` lines carry
//! per-client values (session ids), so they bypass the table and are leaked
//! per response.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use http::header::SET_COOKIE;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use may_minihttp::Response;
use std::io;
use std::sync::OnceLock;
use tracing::warn;

use super::sink::ResponseSink;

/// Upper bound on distinct header lines kept for the process lifetime.
pub const MAX_INTERNED_HEADER_LINES: usize = 4096;

/// Header slots available in a `may_minihttp` response.
pub const MAX_RESPONSE_HEADERS: usize = 16;

/// Bounded table of leaked `'static` header lines.
#[derive(Debug)]
pub struct HeaderLines {
    lines: DashMap<Box<str>, &'static str>,
    capacity: usize,
}

impl HeaderLines {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: DashMap::new(),
            capacity,
        }
    }

    /// Number of interned lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// `'static` copy of `"name: value"`.
    ///
    /// Returns `None` if the value is not visible ASCII, or if the table is
    /// full and the line is neither interned already nor a `Set-Cookie`.
    pub fn line(&self, name: &HeaderName, value: &HeaderValue) -> Option<&'static str> {
        let value = value.to_str().ok()?;
        let line = format!("{name}: {value}");
        if *name == SET_COOKIE {
            let leaked: &'static str = Box::leak(line.into_boxed_str());
            return Some(leaked);
        }
        if let Some(existing) = self.lines.get(line.as_str()) {
            return Some(*existing);
        }
        if self.lines.len() >= self.capacity {
            return None;
        }
        match self.lines.entry(line.into_boxed_str()) {
            Entry::Occupied(entry) => Some(*entry.get()),
            Entry::Vacant(entry) => {
                let leaked: &'static str = Box::leak(entry.key().clone());
                entry.insert(leaked);
                Some(leaked)
            }
        }
    }
}

/// The process-wide table used by the `may_minihttp` sink.
pub fn header_lines() -> &'static HeaderLines {
    static HEADER_LINES: OnceLock<HeaderLines> = OnceLock::new();
    HEADER_LINES.get_or_init(|| HeaderLines::with_capacity(MAX_INTERNED_HEADER_LINES))
}

impl ResponseSink for Response<'_> {
    fn write_head(&mut self, status: StatusCode, headers: &HeaderMap) -> io::Result<()> {
        self.status_code(
            usize::from(status.as_u16()),
            status.canonical_reason().unwrap_or("Unknown"),
        );
        let table = header_lines();
        let mut slots = MAX_RESPONSE_HEADERS;
        for (name, value) in headers {
            if slots == 0 {
                warn!(header = %name, "Response header dropped, no header slots left");
                continue;
            }
            match table.line(name, value) {
                Some(line) => {
                    self.header(line);
                    slots -= 1;
                }
                None => warn!(header = %name, "Response header dropped"),
            }
        }
        Ok(())
    }

    fn write_body(&mut self, body: &[u8]) -> io::Result<usize> {
        self.body_vec(body.to_vec());
        Ok(body.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{CONTENT_TYPE, ETAG};

    #[test]
    fn test_interned_lines_are_reused() {
        let table = HeaderLines::with_capacity(8);
        let value = HeaderValue::from_static("application/json");
        let a = table.line(&CONTENT_TYPE, &value).unwrap();
        let b = table.line(&CONTENT_TYPE, &value).unwrap();
        assert_eq!(a, "content-type: application/json");
        assert!(std::ptr::eq(a, b));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_non_ascii_value_is_rejected() {
        let table = HeaderLines::with_capacity(8);
        let value = HeaderValue::from_bytes(b"caf\xe9").unwrap();
        assert!(table.line(&CONTENT_TYPE, &value).is_none());
    }

    #[test]
    fn test_cookies_are_written_when_table_is_full() {
        let table = HeaderLines::with_capacity(2);
        for tag in ["\"a\"", "\"b\""] {
            assert!(table.line(&ETAG, &HeaderValue::from_static(tag)).is_some());
        }
        assert!(table
            .line(&ETAG, &HeaderValue::from_static("\"c\""))
            .is_none());
        // Lines seen before the table filled up still resolve.
        assert!(table
            .line(&ETAG, &HeaderValue::from_static("\"a\""))
            .is_some());

        for session in ["session=01A; Path=/", "session=01B; Path=/"] {
            let line = table
                .line(&SET_COOKIE, &HeaderValue::from_static(session))
                .unwrap();
            assert_eq!(line, format!("set-cookie: {session}"));
        }
        assert_eq!(table.len(), 2);
    }
}
