//! External tool execution

use crate::error::{MagicBucketError, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// One finished external command
#[derive(Debug, Clone, Default)]
pub struct ProcessInvocation {
    pub args: Vec<String>,
    /// Raw bytes; some tools print binary header fields
    pub stdout: Vec<u8>,
    pub stderr: String,
    pub exit_code: i32,
}

impl ProcessInvocation {
    /// stdout followed by stderr, for logs and error messages
    pub fn combined_output(&self) -> String {
        format!("{}{}", String::from_utf8_lossy(&self.stdout), self.stderr)
    }
}

/// Runs external commands for tasks
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `args` (program first) inside `cwd` and wait for it to exit.
    ///
    /// A non-zero exit becomes `MagicBucketError::Subprocess`.
    async fn run(&self, args: &[String], cwd: &Path) -> Result<ProcessInvocation>;
}

/// Runs commands as child processes of the worker
#[derive(Debug, Clone, Default)]
pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, args: &[String], cwd: &Path) -> Result<ProcessInvocation> {
        let (program, rest) = args
            .split_first()
            .ok_or_else(|| MagicBucketError::Config("Empty command line".to_string()))?;

        debug!("Spawning {:?} in {}", args, cwd.display());
        let output = Command::new(program)
            .args(rest)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| MagicBucketError::Subprocess {
                program: program.clone(),
                exit_code: -1,
                output: format!("failed to start: {}", e),
            })?;

        let invocation = ProcessInvocation {
            args: args.to_vec(),
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        };

        if !output.status.success() {
            return Err(MagicBucketError::Subprocess {
                program: program.clone(),
                exit_code: invocation.exit_code,
                output: invocation.combined_output(),
            });
        }

        Ok(invocation)
    }
}

/// Build an owned argument vector
pub fn argv<S: AsRef<str>>(args: &[S]) -> Vec<String> {
    args.iter().map(|a| a.as_ref().to_string()).collect()
}
