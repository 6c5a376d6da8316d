//! # Dispatcher Module
//!
//! The end of every request chain. [`Dispatcher`] resolves `(method, path)`
//! against the frozen route table, fills the context with the match and calls
//! the registered handler. [`flush_layer`] sits directly around it and writes
//! the staged response to the transport as soon as the handler returns.
//!
//! ## Request Flow
//!
//! 1. Outer middleware pre-phases run
//! 2. The dispatcher looks up the route; a miss stages `404 NOT FOUND`
//! 3. Path parameters and the matched route are copied into the context
//! 4. The handler stages status, headers and body
//! 5. The flush layer writes them exactly once
//! 6. Middleware post-phases run, innermost first

mod core;

pub use core::{flush_layer, Dispatcher, NOT_FOUND_BODY};
