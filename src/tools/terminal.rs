//! Terminal/shell command execution tool.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::{Tool, ToolContext};

const MAX_OUTPUT_LEN: usize = 10_000;

/// Run a shell command in the workspace directory.
pub struct RunCommand {
    timeout: Duration,
}

impl RunCommand {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for RunCommand {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

#[async_trait]
impl Tool for RunCommand {
    fn name(&self) -> &str {
        "run_command"
    }

    fn description(&self) -> &str {
        "Execute a shell command in the workspace directory. The input is the command line. Returns the exit code, stdout and stderr."
    }

    async fn execute(&self, ctx: &ToolContext, input: &str) -> anyhow::Result<String> {
        let command = input.trim();
        if command.is_empty() {
            anyhow::bail!("Missing command");
        }

        tracing::info!(iteration = ctx.iteration, "Executing command: {}", command);

        let (shell, shell_arg) = if cfg!(target_os = "windows") {
            ("cmd", "/C")
        } else {
            ("sh", "-c")
        };

        let child = Command::new(shell)
            .arg(shell_arg)
            .arg(command)
            .current_dir(&ctx.workspace)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::select! {
            _ = ctx.cancel.cancelled() => anyhow::bail!("Command cancelled"),
            res = tokio::time::timeout(self.timeout, child) => res
                .map_err(|_| anyhow::anyhow!("Command timed out after {} seconds", self.timeout.as_secs()))?
                .map_err(|e| anyhow::anyhow!("Failed to execute command: {}", e))?,
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let exit_code = output.status.code().unwrap_or(-1);

        let mut result = format!("Exit code: {}\n", exit_code);

        if !stdout.is_empty() {
            result.push_str("\n--- stdout ---\n");
            result.push_str(&stdout);
        }

        if !stderr.is_empty() {
            result.push_str("\n--- stderr ---\n");
            result.push_str(&stderr);
        }

        Ok(truncate(result, MAX_OUTPUT_LEN))
    }
}

fn truncate(mut s: String, max_len: usize) -> String {
    if s.len() <= max_len {
        return s;
    }
    let mut cut = max_len;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
    s.push_str("\n... [output truncated]");
    s
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tokio_util::sync::CancellationToken;

    fn ctx_in(dir: &std::path::Path) -> ToolContext {
        ToolContext::new(dir.to_path_buf(), CancellationToken::new())
    }

    #[tokio::test]
    async fn runs_in_workspace() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "hello").unwrap();

        let out = RunCommand::default()
            .execute(&ctx_in(dir.path()), "cat marker.txt")
            .await
            .unwrap();
        assert!(out.starts_with("Exit code: 0"));
        assert!(out.contains("hello"));
    }

    #[tokio::test]
    async fn empty_command_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(RunCommand::default()
            .execute(&ctx_in(dir.path()), "   ")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn cancellation_stops_command() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx_in(dir.path());
        ctx.cancel.cancel();

        let err = RunCommand::default()
            .execute(&ctx, "sleep 5")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("cancelled"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let s = "é".repeat(10);
        let out = truncate(s, 5);
        assert!(out.starts_with("éé"));
        assert!(out.ends_with("[output truncated]"));
    }
}
