//! Structured logging setup for the `webtrie` binary and embedders.
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! up to the process. [`init_logging`] installs a `tracing_subscriber`
//! registry with an `EnvFilter` and either a JSON or a pretty formatter.

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `default_directive` when set. `may_minihttp` is
/// capped at `warn` to keep connection noise out of the logs.
///
/// # Errors
///
/// Fails if a global subscriber is already installed or a directive does
/// not parse.
pub fn init_logging(default_directive: &str, format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .with_context(|| format!("invalid log filter '{default_directive}'"))?
        .add_directive(
            "may_minihttp=warn"
                .parse::<Directive>()
                .context("invalid may_minihttp directive")?,
        );

    let fmt_layer = match format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_span_list(true)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(false)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;
    Ok(())
}
