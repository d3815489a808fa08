//! Error types for the system-test runner
//!
//! Error messages are written for the operator running the suite,
//! with hints on how to resolve common setup problems.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the system-test runner
#[derive(Error, Debug)]
pub enum Error {
    // === Prerequisite Errors ===
    #[error(
        "The Cloud SDK must be installed and configured to deploy to App Engine. \
         Run 'gcloud config set project <id>' and try again"
    )]
    MissingProject,

    #[error("Credential file '{0}' not found")]
    CredentialsNotFound(PathBuf),

    #[error("Cloud SDK executable not found at '{0}'. Run 'systest provision' first")]
    SdkNotFound(PathBuf),

    // === External Command Errors ===
    #[error("Failed to start '{command}': {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Command '{command}' failed with exit code {code:?}{stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Failed to download {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("Failed to extract '{path}': {reason}")]
    Extract { path: PathBuf, reason: String },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Unknown scenario '{name}'. Known scenarios: {known}")]
    UnknownScenario { name: String, known: String },

    // === Run Errors ===
    #[error("{0} scenario(s) failed")]
    ScenariosFailed(usize),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an unknown scenario error listing the known names
    pub fn unknown_scenario<S: AsRef<str>>(name: &str, known: &[S]) -> Self {
        Self::UnknownScenario {
            name: name.to_string(),
            known: known.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join(", "),
        }
    }

    /// Create a command failure error
    ///
    /// `stderr` is appended to the message only when non-empty.
    pub fn command_failed(command: &str, code: Option<i32>, stderr: &str) -> Self {
        let stderr = stderr.trim();
        Self::CommandFailed {
            command: command.to_string(),
            code,
            stderr: if stderr.is_empty() {
                String::new()
            } else {
                format!(":\n{}", stderr)
            },
        }
    }

    /// Create a download error
    pub fn download(url: &str, reason: impl ToString) -> Self {
        Self::Download {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}
