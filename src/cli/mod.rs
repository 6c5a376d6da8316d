//! # CLI Module
//!
//! The `webtrie` binary: a demo application built on the library, with the
//! runtime configuration layered from file, environment and flags.
//!
//! ## Commands
//!
//! ### `serve`
//!
//! ```bash
//! webtrie serve --addr 0.0.0.0:8080 --stack-size 0x8000 --workers 4
//! ```
//!
//! Options:
//! - `--addr <HOST:PORT>` - listen address (default `127.0.0.1:8080`)
//! - `--stack-size <BYTES>` - coroutine stack size, decimal or hex
//! - `--workers <N>` - `may` worker threads
//! - `--templates <DIR>` - load templates from a directory
//!
//! ### `routes`
//!
//! Print the route table without binding a socket:
//!
//! ```bash
//! webtrie routes
//! ```
//!
//! ## Global options
//!
//! - `--config <FILE>` - TOML file, see [`crate::runtime_config`]
//! - `--log-format json|pretty`
//! - `--log-level <FILTER>` - default filter when `RUST_LOG` is unset
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use clap::Parser;
//! use webtrie::cli::{run_cli, Cli};
//!
//! run_cli(Cli::parse())?;
//! ```

mod commands;
mod demo;


pub use commands::{run_cli, Cli, Commands};
pub use demo::demo_server;
