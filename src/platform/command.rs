//! Bounded execution of external diagnostic tools.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::ProbeError;

/// Runs an executable and returns its stdout when it exits successfully.
///
/// Implementations must never wait longer than `timeout`.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[&str], timeout: Duration)
        -> Result<String, ProbeError>;
}

/// Spawns real child processes on the Tokio runtime.
///
/// The child is killed if it outlives the timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioCommandRunner;

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<String, ProbeError> {
        let path = which::which(program).map_err(|_| ProbeError::Missing(program.to_string()))?;

        let child = Command::new(&path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| match source.kind() {
                std::io::ErrorKind::NotFound => ProbeError::Missing(program.to_string()),
                _ => ProbeError::Spawn {
                    program: program.to_string(),
                    source,
                },
            })?;

        // Dropping the future on timeout drops the child, which kills it
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ProbeError::malformed(
                    program,
                    format!("failed to read output: {}", e),
                ))
            }
            Err(_) => {
                return Err(ProbeError::Timeout {
                    program: program.to_string(),
                    timeout,
                })
            }
        };

        if !output.status.success() {
            return Err(ProbeError::ExitStatus {
                program: program.to_string(),
                code: output.status.code(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
