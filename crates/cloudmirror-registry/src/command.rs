//! External CLI execution
//!
//! Every destination is driven through a vendor CLI (`aws`, `gcloud`, `az`)
//! plus `crane` for the copy itself. [`CommandRunner`] is the seam that lets
//! adapters be exercised without spawning processes.

use crate::error::{RegistryError, Result};
use async_trait::async_trait;
use std::fmt;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// A single CLI invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
    secret_args: Vec<usize>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            secret_args: Vec::new(),
        }
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

    /// Argument that must never appear in logs
    pub fn secret_arg(mut self, arg: impl Into<String>) -> Self {
        self.secret_args.push(self.args.len());
        self.args.push(arg.into());
        self
    }

    /// Data written to the child's stdin (never logged)
    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for (i, arg) in self.args.iter().enumerate() {
            if self.secret_args.contains(&i) {
                f.write_str(" ****")?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Trimmed stdout on success, `CommandFailed` otherwise
    pub fn into_result(self, program: &str) -> Result<String> {
        if self.success {
            Ok(self.stdout.trim().to_string())
        } else {
            Err(RegistryError::CommandFailed {
                program: program.to_string(),
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Executes CLI invocations
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion; `Err` only when the process could not be started
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput>;

    /// Run and require a zero exit status, returning trimmed stdout
    async fn run_checked(&self, invocation: &Invocation) -> Result<String> {
        self.run(invocation)
            .await?
            .into_result(&invocation.program)
    }

    /// Run and report only whether the command succeeded
    async fn succeeds(&self, invocation: &Invocation) -> bool {
        match self.run(invocation).await {
            Ok(output) => output.success,
            Err(e) => {
                tracing::debug!("{}", e);
                false
            }
        }
    }
}

/// Runs commands as child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        tracing::debug!("Running: {}", invocation);

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.stdin(if invocation.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                RegistryError::CommandNotFound(invocation.program.clone())
            } else {
                RegistryError::CommandSpawn {
                    program: invocation.program.clone(),
                    source,
                }
            }
        })?;

        if let (Some(input), Some(mut stdin)) = (&invocation.stdin, child.stdin.take()) {
            stdin
                .write_all(input.as_bytes())
                .await
                .map_err(|source| RegistryError::CommandSpawn {
                    program: invocation.program.clone(),
                    source,
                })?;
            // stdin is closed on drop so the child sees EOF
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| RegistryError::CommandSpawn {
                program: invocation.program.clone(),
                source,
            })?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_display_redacts_secrets() {
        let inv = Invocation::new("az")
            .args(["login", "--service-principal", "-u", "app-id", "-p"])
            .secret_arg("hunter2")
            .args(["--tenant", "tenant-id"]);

        let shown = inv.to_string();
        assert_eq!(
            shown,
            "az login --service-principal -u app-id -p **** --tenant tenant-id"
        );
        assert!(!shown.contains("hunter2"));
        assert_eq!(inv.args[5], "hunter2");
    }

    #[test]
    fn test_invocation_display_omits_stdin() {
        let inv = Invocation::new("crane")
            .args(["auth", "login", "registry.digitalocean.com", "--password-stdin"])
            .stdin("dop_v1_secret");
        assert!(!inv.to_string().contains("dop_v1_secret"));
    }

    #[test]
    fn test_output_into_result() {
        assert_eq!(
            CommandOutput::ok("  123456789012\n").into_result("aws").unwrap(),
            "123456789012"
        );

        let err = CommandOutput::failed("AccessDenied\n")
            .into_result("aws")
            .unwrap_err();
        assert_eq!(err.to_string(), "aws failed: AccessDenied");
    }

    #[tokio::test]
    async fn test_process_runner_missing_program() {
        let runner = ProcessRunner::new();
        let inv = Invocation::new("cloudmirror-definitely-not-installed");

        let err = runner.run(&inv).await.unwrap_err();
        assert!(matches!(err, RegistryError::CommandNotFound(_)));
        assert!(!runner.succeeds(&inv).await);
    }
}
