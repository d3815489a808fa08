//! systest - environment setup and session runner for the auth system tests
//!
//! This library provisions the Cloud SDK, installs credentials and runs
//! declarative test scenarios through an external test command.

pub mod cli;
pub mod commands;
pub mod common;
pub mod process;
pub mod sdk;
pub mod session;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use session::{Scenario, SessionRunner};
