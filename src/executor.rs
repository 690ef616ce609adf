use log::{debug, warn};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Default per-command budget. Long-running tasks override it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Terminal classification of an external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandStatus {
    /// Exit code 0.
    Success,
    /// Ran to completion with a non-zero exit code.
    ToolFailure(i32),
    /// Did not finish before the deadline; the process was killed.
    Timeout(u64),
    /// The program could not be launched at all.
    ExecutionError(String),
}

/// Outcome of one external command. Consumed immediately by the caller,
/// never persisted.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub status: CommandStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn is_success(&self) -> bool {
        self.status == CommandStatus::Success
    }

    /// Diagnostic payload for a failed invocation: stderr when the tool ran,
    /// otherwise the classification itself.
    pub fn diagnostic(&self) -> String {
        match &self.status {
            CommandStatus::Success => String::new(),
            CommandStatus::ToolFailure(_) => {
                if self.stderr.trim().is_empty() {
                    self.stdout.trim().to_string()
                } else {
                    self.stderr.trim().to_string()
                }
            }
            CommandStatus::Timeout(secs) => {
                format!("Command timed out after {} seconds", secs)
            }
            CommandStatus::ExecutionError(reason) => reason.clone(),
        }
    }
}

/// Run an external program with a bounded deadline, capturing both output
/// streams as text. Arguments are always passed as an argv vector; nothing is
/// interpolated through a shell.
pub async fn execute(program: &str, args: &[String], deadline: Duration) -> CommandResult {
    debug!("Executing: {} {}", program, args.join(" "));

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            warn!("Failed to launch {}: {}", program, e);
            return CommandResult {
                status: CommandStatus::ExecutionError(e.to_string()),
                stdout: String::new(),
                stderr: String::new(),
            };
        }
    };

    // kill_on_drop reaps the child when the deadline drops the future.
    match timeout(deadline, child.wait_with_output()).await {
        Ok(Ok(output)) => {
            let stdout = String::from_utf8_lossy(&output.stdout).to_string();
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();

            let status = if output.status.success() {
                CommandStatus::Success
            } else {
                let code = output.status.code().unwrap_or(-1);
                debug!("{} exited with code {}", program, code);
                CommandStatus::ToolFailure(code)
            };

            CommandResult {
                status,
                stdout,
                stderr,
            }
        }
        Ok(Err(e)) => CommandResult {
            status: CommandStatus::ExecutionError(e.to_string()),
            stdout: String::new(),
            stderr: String::new(),
        },
        Err(_) => {
            let secs = deadline.as_secs();
            warn!("{} timed out after {} seconds", program, secs);
            CommandResult {
                status: CommandStatus::Timeout(secs),
                stdout: String::new(),
                stderr: format!("Command timed out after {} seconds", secs),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn classifies_success() {
        let result = execute("true", &[], DEFAULT_TIMEOUT).await;
        assert_eq!(result.status, CommandStatus::Success);
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn classifies_tool_failure_with_exit_code() {
        let result = execute("false", &[], DEFAULT_TIMEOUT).await;
        assert_eq!(result.status, CommandStatus::ToolFailure(1));
    }

    #[tokio::test]
    async fn classifies_timeout() {
        let result = execute("sleep", &argv(&["5"]), Duration::from_secs(1)).await;
        assert_eq!(result.status, CommandStatus::Timeout(1));
        assert!(result.diagnostic().contains("timed out"));
    }

    #[tokio::test]
    async fn classifies_execution_error() {
        let result = execute("definitely-not-a-real-binary-4242", &[], DEFAULT_TIMEOUT).await;
        assert!(matches!(result.status, CommandStatus::ExecutionError(_)));
    }

    #[tokio::test]
    async fn captures_stdout() {
        let result = execute("echo", &argv(&["hello"]), DEFAULT_TIMEOUT).await;
        assert_eq!(result.status, CommandStatus::Success);
        assert_eq!(result.stdout.trim(), "hello");
    }
}
