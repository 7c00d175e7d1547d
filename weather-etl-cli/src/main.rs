//! Binary crate for the `weather-etl` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments and loading configuration
//! - Setting up logging
//! - Wiring the pipeline stages for a scheduler to invoke

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    cli::init_tracing(cmd.log_level);
    cmd.run().await
}
