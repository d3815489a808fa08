//! systest - environment setup and session runner for the auth system tests
//!
//! Provisions the Cloud SDK, installs credentials and environment, then hands
//! each scenario's test file to the test command.

use clap::Parser;
use std::path::PathBuf;
use systest::{cli, commands::Commands, common::logging};

#[derive(Parser)]
#[command(name = "systest", about = "Auth library system-test session runner")]
#[command(version, long_about = None)]
struct Cli {
    /// Config file (default: platform config dir, systest/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log every command line
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init_cli(cli.verbose);

    if let Err(e) = cli::dispatch(cli.command, cli.config).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
