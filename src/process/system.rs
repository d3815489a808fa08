//! Runs commands as real child processes

use super::{CommandRunner, CommandSpec, OutputMode};
use crate::common::{Error, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

/// Spawns commands with `tokio::process`, one at a time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    fn command(spec: &CommandSpec) -> Command {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args).envs(&spec.env).stdin(Stdio::null());
        if let Some(dir) = &spec.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }

    fn spawn_error(spec: &CommandSpec, source: std::io::Error) -> Error {
        Error::CommandSpawn {
            command: spec.program.clone(),
            source,
        }
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<()> {
        match spec.output {
            OutputMode::Secret => tracing::debug!(command = %spec.program, "$ <output suppressed>"),
            _ => tracing::debug!("$ {}", spec),
        }

        let mut cmd = Self::command(spec);
        match spec.output {
            OutputMode::Inherit => {
                let status = cmd
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit())
                    .status()
                    .await
                    .map_err(|e| Self::spawn_error(spec, e))?;
                if !status.success() {
                    return Err(spec.failure(status.code(), ""));
                }
            }
            OutputMode::Silent => {
                let output = cmd
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .output()
                    .await
                    .map_err(|e| Self::spawn_error(spec, e))?;
                if !output.status.success() {
                    return Err(spec.failure(
                        output.status.code(),
                        &String::from_utf8_lossy(&output.stderr),
                    ));
                }
            }
            OutputMode::Secret => {
                let status = cmd
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status()
                    .await
                    .map_err(|e| Self::spawn_error(spec, e))?;
                if !status.success() {
                    return Err(spec.failure(status.code(), ""));
                }
            }
        }
        Ok(())
    }

    async fn output(&self, spec: &CommandSpec) -> Result<String> {
        tracing::debug!("$ {}", spec);

        let output = Self::command(spec)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| Self::spawn_error(spec, e))?;

        if !output.status.success() {
            return Err(spec.failure(
                output.status.code(),
                &String::from_utf8_lossy(&output.stderr),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
