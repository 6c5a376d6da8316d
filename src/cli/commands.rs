use anyhow::Context as _;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use super::demo::demo_server;
use crate::logging::{init_logging, LogFormat};
use crate::runtime_config::{parse_size, RuntimeConfig};

/// Command-line interface for webtrie
///
/// Runs the bundled demo application or prints its route table.
#[derive(Parser, Debug)]
#[command(name = "webtrie")]
#[command(about = "webtrie demo server", long_about = None)]
pub struct Cli {
    /// TOML runtime configuration file
    #[arg(short, long, global = true, env = "WEBTRIE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,

    /// Default log filter, overridden by `RUST_LOG`
    #[arg(long, global = true, default_value = "webtrie=info")]
    pub log_level: String,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Serve the demo application
    Serve {
        /// Listen address (`host:port`)
        #[arg(short, long)]
        addr: Option<String>,

        /// Coroutine stack size, decimal or `0x` hex
        #[arg(long, value_parser = parse_stack_size)]
        stack_size: Option<usize>,

        /// Number of `may` worker threads
        #[arg(long)]
        workers: Option<usize>,

        /// Directory of minijinja templates
        #[arg(long)]
        templates: Option<PathBuf>,
    },
    /// Print the demo route table
    Routes,
}

fn parse_stack_size(raw: &str) -> Result<usize, String> {
    parse_size(raw).ok_or_else(|| format!("invalid stack size '{raw}'"))
}

impl Commands {
    /// Lay flag values over `config`; flags win over the file and environment.
    pub fn apply_overrides(&self, config: &mut RuntimeConfig) {
        if let Commands::Serve {
            addr,
            stack_size,
            workers,
            templates,
        } = self
        {
            if let Some(addr) = addr {
                config.addr.clone_from(addr);
            }
            if let Some(stack_size) = stack_size {
                config.stack_size = *stack_size;
            }
            if workers.is_some() {
                config.workers = *workers;
            }
            if templates.is_some() {
                config.templates.clone_from(templates);
            }
        }
    }
}

/// Execute the parsed command line.
///
/// # Errors
///
/// Configuration, logging, route table and bind failures.
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let mut config = RuntimeConfig::load(cli.config.as_deref())?;
    cli.command.apply_overrides(&mut config);

    match cli.command {
        Commands::Serve { .. } => {
            init_logging(&cli.log_level, cli.log_format)?;
            config.apply();
            let server = demo_server(config.templates.as_deref())?;
            info!(addr = %config.addr, stack_size = config.stack_size, "Starting demo server");
            server
                .run(config.addr.as_str())
                .with_context(|| format!("server on {} failed", config.addr))?;
        }
        Commands::Routes => {
            let server = demo_server(config.templates.as_deref())?;
            for (method, path) in server.router().routes() {
                println!("{:<7} {path}", method.as_str());
            }
        }
    }
    Ok(())
}
