//! CLI command definitions
//!
//! Defines the clap commands for the system-test runner.

use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run test scenarios (all of them when no names are given)
    Run {
        /// Scenario names, e.g. grpc default_cloud_sdk_authorized_user
        names: Vec<String>,

        #[command(flatten)]
        table: TableArgs,

        #[command(flatten)]
        paths: PathArgs,

        /// Keep a temporary SDK root after the run
        #[arg(long)]
        keep_sdk_root: bool,

        /// Stop after the first failing scenario
        #[arg(long)]
        fail_fast: bool,

        /// Print the commands that would run without running them
        #[arg(long)]
        dry_run: bool,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// List scenarios with their setup and test file
    List {
        #[command(flatten)]
        table: TableArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download and install the Cloud SDK into the SDK root
    Provision {
        #[command(flatten)]
        paths: PathArgs,
    },
}

/// Where the scenario table comes from
#[derive(Args, Debug, Clone, Default)]
pub struct TableArgs {
    /// YAML file replacing the built-in scenario table
    #[arg(long, value_name = "FILE")]
    pub scenarios: Option<PathBuf>,
}

/// Directory overrides
#[derive(Args, Debug, Clone, Default)]
pub struct PathArgs {
    /// Directory holding the test files, data/ and app_engine_test_app/
    #[arg(long, value_name = "DIR")]
    pub tests_dir: Option<PathBuf>,

    /// Persistent SDK install root (overrides CLOUD_SDK_ROOT)
    #[arg(long, value_name = "DIR")]
    pub sdk_root: Option<PathBuf>,
}
