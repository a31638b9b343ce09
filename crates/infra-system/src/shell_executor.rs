// Shell command executor implementation
// reason: async-trait, tokio for async process management
use async_trait::async_trait;
use std::process::{Output, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use penguin_bridge_core::port::command_executor::{
    normalize_output, CommandExecutor, ExecutionError, ExecutionResult, ExecutionStatus,
};
use penguin_bridge_core::port::TimeProvider;

#[cfg(unix)]
const DEFAULT_SHELL: &str = "sh";
#[cfg(unix)]
const SHELL_COMMAND_FLAG: &str = "-c";

#[cfg(windows)]
const DEFAULT_SHELL: &str = "cmd";
#[cfg(windows)]
const SHELL_COMMAND_FLAG: &str = "/C";

/// Shell executor
/// Runs each task command through the system shell, one process per call
pub struct ShellExecutor {
    time_provider: Arc<dyn TimeProvider>,
    shell: String,
}

impl ShellExecutor {
    /// Create a new shell executor using `sh -c` (`cmd /C` on Windows)
    ///
    /// # Example
    /// ```ignore
    /// let executor = ShellExecutor::new(Arc::new(SystemTimeProvider));
    /// ```
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            time_provider,
            shell: DEFAULT_SHELL.to_string(),
        }
    }

    /// Use another shell binary (must accept the same command flag)
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Spawn the shell and wait for its output within `limit`
    async fn spawn_and_wait(&self, command: &str, limit: Duration) -> Result<Output, ExecutionError> {
        let mut cmd = Command::new(&self.shell);
        cmd.arg(SHELL_COMMAND_FLAG)
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group so a timeout can take down pipelines too
        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd
            .spawn()
            .map_err(|e| ExecutionError::SpawnFailed(e.to_string()))?;
        let pid = child.id();

        match timeout(limit, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(ExecutionError::Io(e.to_string())),
            Err(_) => {
                // Dropping the wait future already killed the shell itself
                if let Some(pid) = pid {
                    kill_process_group(pid);
                }
                Err(ExecutionError::Timeout(limit.as_millis()))
            }
        }
    }

    /// Build execution result from process output
    fn build_result(
        &self,
        command: &str,
        output: Output,
        duration_ms: i64,
    ) -> Result<ExecutionResult, ExecutionError> {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        debug!(command = %command, stdout = %stdout, stderr = %stderr, "Command output");

        let status = if output.status.success() {
            ExecutionStatus::Success
        } else {
            warn!(
                command = %command,
                exit_code = ?output.status.code(),
                "Command exited with failure status, using its output anyway"
            );
            ExecutionStatus::Failed
        };

        let value = normalize_output(&stdout);
        if value.is_empty() {
            return Err(ExecutionError::EmptyOutput);
        }

        Ok(ExecutionResult {
            status,
            value,
            stderr,
            exit_code: output.status.code(),
            duration_ms,
        })
    }
}

#[cfg(unix)]
fn kill_process_group(pid: u32) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        // ESRCH: the group is already gone
        debug!(pid = %pid, error = %e, "Process group kill after timeout failed");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}

#[async_trait]
impl CommandExecutor for ShellExecutor {
    async fn execute(
        &self,
        command: &str,
        limit: Duration,
    ) -> Result<ExecutionResult, ExecutionError> {
        let start_time = self.time_provider.now_millis();

        info!(
            command = %command,
            timeout_ms = %limit.as_millis(),
            "Starting command execution"
        );

        let output = self.spawn_and_wait(command, limit).await?;

        let duration_ms = self.time_provider.now_millis() - start_time;
        let result = self.build_result(command, output, duration_ms)?;

        debug!(
            command = %command,
            duration_ms = %duration_ms,
            exit_code = ?result.exit_code,
            status = ?result.status,
            "Command execution completed"
        );

        Ok(result)
    }
}
