// Command Executor Port
// Abstraction for running one configured shell command under a time budget

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Result of a command that ran to completion and printed something
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    /// Standard output collapsed to a single line (see `normalize_output`)
    pub value: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub duration_ms: i64,
}

/// Exit status of a completed command
///
/// A non-zero exit is not an execution error: its output is still used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    Success,
    Failed,
}

/// Execution errors
///
/// Never escape a pass; the task runner maps each of them to the sentinel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Process timeout after {0}ms")]
    Timeout(u128),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Process produced no output")]
    EmptyOutput,
}

/// Command Executor trait
///
/// Implementations:
/// - ShellExecutor: runs the command through `sh -c`
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run `command` and capture its standard output
    ///
    /// # Errors
    /// - ExecutionError::SpawnFailed if the shell cannot be started
    /// - ExecutionError::Timeout if the command exceeds `timeout`
    /// - ExecutionError::EmptyOutput if nothing but newlines was printed
    async fn execute(&self, command: &str, timeout: Duration)
        -> Result<ExecutionResult, ExecutionError>;
}

/// Collapse raw command output to a single line by dropping every
/// line terminator, e.g. `"42\n"` -> `"42"`.
pub fn normalize_output(raw: &str) -> String {
    raw.chars().filter(|c| *c != '\n' && *c != '\r').collect()
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Scripted outcome for one command
    #[derive(Debug, Clone)]
    pub enum MockOutcome {
        /// Print this output (normalized like the real executor)
        Output(String),
        /// Fail with this error
        Fail(ExecutionError),
    }

    /// Mock Command Executor for testing
    ///
    /// Commands without a scripted outcome behave as if they printed nothing.
    #[derive(Default)]
    pub struct MockCommandExecutor {
        outcomes: Arc<Mutex<HashMap<String, MockOutcome>>>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl MockCommandExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        /// Script `command` to print `output`
        pub fn with_output(self, command: impl Into<String>, output: impl Into<String>) -> Self {
            self.set_output(command, output);
            self
        }

        /// Script `command` to fail
        pub fn with_error(self, command: impl Into<String>, error: ExecutionError) -> Self {
            self.outcomes
                .lock()
                .unwrap()
                .insert(command.into(), MockOutcome::Fail(error));
            self
        }

        /// Change the output of `command` between passes
        pub fn set_output(&self, command: impl Into<String>, output: impl Into<String>) {
            self.outcomes
                .lock()
                .unwrap()
                .insert(command.into(), MockOutcome::Output(output.into()));
        }

        /// Commands executed so far, in order
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CommandExecutor for MockCommandExecutor {
        async fn execute(
            &self,
            command: &str,
            _timeout: Duration,
        ) -> Result<ExecutionResult, ExecutionError> {
            self.calls.lock().unwrap().push(command.to_string());

            let outcome = self.outcomes.lock().unwrap().get(command).cloned();

            match outcome {
                Some(MockOutcome::Output(raw)) => {
                    let value = normalize_output(&raw);
                    if value.is_empty() {
                        return Err(ExecutionError::EmptyOutput);
                    }
                    Ok(ExecutionResult {
                        status: ExecutionStatus::Success,
                        value,
                        stderr: String::new(),
                        exit_code: Some(0),
                        duration_ms: 1,
                    })
                }
                Some(MockOutcome::Fail(e)) => Err(e),
                None => Err(ExecutionError::EmptyOutput),
            }
        }
    }
}
