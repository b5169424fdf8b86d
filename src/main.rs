//! # mysql-tools
//!
//! Entry point: parse the command line, set up tracing and dispatch.
//! Progress lines and diagnostics go to stderr through `tracing`; command
//! results go to stdout.

#![forbid(unsafe_code)]
#![forbid(clippy::unwrap_used)]
#![forbid(clippy::panic)]
#![deny(clippy::expect_used)]

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use mysql_tools::cli::Cli;
use mysql_tools::commands::execute_command;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing();

    execute_command(cli.command).await
}

/// Initialize tracing. `RUST_LOG` overrides the default `info` level.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
