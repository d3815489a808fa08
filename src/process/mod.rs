//! External command execution
//!
//! Every subprocess the runner starts is described by a [`CommandSpec`] and
//! executed through the [`CommandRunner`] trait, so sessions can be run for
//! real ([`SystemRunner`]) or recorded ([`RecordingRunner`]) for dry runs.

mod recording;
mod system;

pub use recording::RecordingRunner;
pub use system::SystemRunner;

use crate::common::{Error, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Environment assignments for one session's child processes
pub type SessionEnv = BTreeMap<String, String>;

/// What happens to a command's stdout/stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Stream to the terminal
    #[default]
    Inherit,
    /// Capture; stderr is surfaced only if the command fails
    Silent,
    /// Discard; never surfaced, even on failure
    Secret,
}

/// A single external command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Variables added on top of the inherited environment
    pub env: BTreeMap<String, String>,
    pub cwd: Option<PathBuf>,
    pub output: OutputMode,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
            output: OutputMode::Inherit,
        }
    }

    /// Command whose program is a filesystem path
    pub fn path(program: &Path) -> Self {
        Self::new(program.display().to_string())
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn envs(mut self, env: &SessionEnv) -> Self {
        self.env
            .extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn silent(mut self) -> Self {
        self.output = OutputMode::Silent;
        self
    }

    pub fn secret(mut self) -> Self {
        self.output = OutputMode::Secret;
        self
    }

    /// Build the failure error for this command
    ///
    /// Output of secret commands is dropped.
    pub fn failure(&self, code: Option<i32>, stderr: &str) -> Error {
        let stderr = match self.output {
            OutputMode::Secret => "",
            _ => tail(stderr, STDERR_TAIL_LINES),
        };
        Error::command_failed(&self.to_string(), code, stderr)
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Lines of stderr kept in a failure message
const STDERR_TAIL_LINES: usize = 20;

fn tail(text: &str, lines: usize) -> &str {
    let trimmed = text.trim_end();
    match trimmed.rmatch_indices('\n').nth(lines.saturating_sub(1)) {
        Some((idx, _)) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Executes external commands
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion; non-zero exit is an error
    async fn run(&self, spec: &CommandSpec) -> Result<()>;

    /// Run to completion and return captured stdout
    async fn output(&self, spec: &CommandSpec) -> Result<String>;
}
