//! # Context Module
//!
//! One [`Context`] exists per request. The server builds it, the router fills
//! in `path_params` and `matched_route`, handlers stage the response, and the
//! flush layer writes the staged state out once.
//!
//! Lookups return a [`StringValue`]: either the raw string or the lookup
//! error, carried through to whichever typed accessor the caller uses.
//!
//! [`SafeContext`] is the lock-protected variant for requests whose handling
//! fans out to several threads that all stage response data.

mod core;
mod error;
mod safe;
mod value;

pub use core::Context;
pub use error::ContextError;
pub use safe::SafeContext;
pub use value::StringValue;
