//! Records commands instead of running them
//!
//! Used for `--dry-run` and by the session tests. Responses can be scripted
//! per command prefix; anything unscripted succeeds with empty output.

use super::{CommandRunner, CommandSpec};
use crate::common::Result;
use async_trait::async_trait;
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Scripted {
    Output(String),
    Fail { code: i32, stderr: String },
}

/// A [`CommandRunner`] that remembers every spec it is given
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<CommandSpec>>,
    scripted: Mutex<Vec<(String, Scripted)>>,
    echo: bool,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Print each command as `$ cmd` when it is recorded
    pub fn echo(mut self) -> Self {
        self.echo = true;
        self
    }

    /// Return `stdout` for commands whose display starts with `prefix`
    pub fn respond(&self, prefix: &str, stdout: &str) {
        self.script(prefix, Scripted::Output(stdout.to_string()));
    }

    /// Fail commands whose display starts with `prefix`
    pub fn fail(&self, prefix: &str, code: i32, stderr: &str) {
        self.script(
            prefix,
            Scripted::Fail {
                code,
                stderr: stderr.to_string(),
            },
        );
    }

    fn script(&self, prefix: &str, response: Scripted) {
        if let Ok(mut scripted) = self.scripted.lock() {
            scripted.push((prefix.to_string(), response));
        }
    }

    /// Every command recorded so far, in order
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Recorded commands rendered as command lines
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(ToString::to_string).collect()
    }

    fn record(&self, spec: &CommandSpec) -> Option<Scripted> {
        if self.echo {
            match &spec.cwd {
                Some(dir) => println!("$ (cd {}) {}", dir.display(), spec),
                None => println!("$ {}", spec),
            }
        }
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(spec.clone());
        }

        let line = spec.to_string();
        self.scripted.lock().ok().and_then(|scripted| {
            scripted
                .iter()
                .find(|(prefix, _)| line.starts_with(prefix.as_str()))
                .map(|(_, response)| response.clone())
        })
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<()> {
        self.output(spec).await.map(|_| ())
    }

    async fn output(&self, spec: &CommandSpec) -> Result<String> {
        match self.record(spec) {
            Some(Scripted::Output(stdout)) => Ok(stdout),
            Some(Scripted::Fail { code, stderr }) => Err(spec.failure(Some(code), &stderr)),
            None => Ok(String::new()),
        }
    }
}
