//! Request identifiers.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Header carrying an upstream request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-request identifier backed by a ULID.
///
/// Every [`Context`](crate::context::Context) carries one. It is taken from an
/// incoming `x-request-id` header when that parses as a ULID, and generated
/// otherwise.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct RequestId(pub ulid::Ulid);

impl RequestId {
    /// Generate a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// Reuse the header value if it is a valid ULID, otherwise generate one.
    #[must_use]
    pub fn from_header_or_new(header_value: Option<&str>) -> Self {
        header_value
            .and_then(|s| s.trim().parse::<RequestId>().ok())
            .unwrap_or_default()
    }

    /// Resolve the id for an incoming request.
    #[must_use]
    pub fn for_request<B>(req: &http::Request<B>) -> Self {
        Self::from_header_or_new(
            req.headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok()),
        )
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ulid::Ulid::from_string(s).map(RequestId)
    }
}
