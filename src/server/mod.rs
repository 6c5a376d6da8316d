//! # Server Module
//!
//! [`HttpServer`] is the registration phase: routes, middleware and the
//! template engine. [`HttpServer::into_service`] freezes it into an
//! [`AppService`], whose [`serve`](AppService::serve) runs one request through
//! the composed chain and writes the result to a [`ResponseSink`].
//!
//! `AppService` implements `may_minihttp::HttpService`, so
//! [`AppService::start`] serves every connection on its own `may` coroutine.
//! Embedders with another transport call `serve` directly, for example with a
//! [`RecordingSink`].

mod core;
mod http_server;
mod request;
mod response;
mod sink;

pub use core::{AppService, HttpServer};
pub use http_server::ServerHandle;
pub use request::into_http_request;
pub use response::{header_lines, HeaderLines, MAX_INTERNED_HEADER_LINES, MAX_RESPONSE_HEADERS};
pub use sink::{RecordingSink, ResponseSink};
