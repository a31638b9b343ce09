//! Task Runner - one full pass over the configured tasks
//!
//! A pass fetches the remote snapshot once, then for every task in order:
//! execute the command, diff against the snapshot, push if changed.
//! Nothing inside a pass is fatal; every failure is logged and the pass
//! moves on to the next task.

use std::sync::Arc;

use tracing::{error, info, warn, Instrument, Span};

use super::constants::SENTINEL_VALUE;
use super::diff::needs_update;
use crate::domain::{BridgeConfig, Snapshot, TaskDefinition};
use crate::port::{CommandExecutor, RemoteState, TimeProvider};

/// What happened to one task during a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Value unchanged, unknown baseline or unparsable
    Skipped,
    /// Value written to the remote
    Pushed,
    /// Write attempted and rejected or lost
    PushFailed,
}

impl std::fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateOutcome::Skipped => write!(f, "SKIPPED"),
            UpdateOutcome::Pushed => write!(f, "PUSHED"),
            UpdateOutcome::PushFailed => write!(f, "PUSH_FAILED"),
        }
    }
}

/// Per-task line of a pass report
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub variable_name: String,
    /// Command output, or the sentinel
    pub value: String,
    pub outcome: UpdateOutcome,
}

/// Summary of one pass (informational, never drives control flow)
#[derive(Debug, Clone)]
pub struct PassReport {
    pub started_at_ms: i64,
    pub duration_ms: i64,
    pub snapshot_available: bool,
    pub tasks: Vec<TaskOutcome>,
}

impl PassReport {
    pub fn pushed_count(&self) -> usize {
        self.count(UpdateOutcome::Pushed)
    }

    pub fn failed_count(&self) -> usize {
        self.count(UpdateOutcome::PushFailed)
    }

    fn count(&self, outcome: UpdateOutcome) -> usize {
        self.tasks.iter().filter(|t| t.outcome == outcome).count()
    }
}

/// Runs passes over a fixed configuration.
///
/// The runner has no notion of time between passes; whoever owns it decides
/// when `run_pass` is called.
pub struct TaskRunner {
    config: Arc<BridgeConfig>,
    executor: Arc<dyn CommandExecutor>,
    remote: Arc<dyn RemoteState>,
    time_provider: Arc<dyn TimeProvider>,
    span: Span,
}

impl TaskRunner {
    /// Create a runner
    ///
    /// # Arguments
    /// * `span` - Logging handle; every pass is recorded inside it
    pub fn new(
        config: Arc<BridgeConfig>,
        executor: Arc<dyn CommandExecutor>,
        remote: Arc<dyn RemoteState>,
        time_provider: Arc<dyn TimeProvider>,
        span: Span,
    ) -> Self {
        Self {
            config,
            executor,
            remote,
            time_provider,
            span,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Run one full pass. Never fails.
    pub async fn run_pass(&self) -> PassReport {
        self.run_pass_internal().instrument(self.span.clone()).await
    }

    async fn run_pass_internal(&self) -> PassReport {
        let started_at_ms = self.time_provider.now_millis();
        info!(tasks = self.config.tasks().len(), "Running task pass");

        let snapshot = self.fetch_snapshot().await;

        let mut tasks = Vec::with_capacity(self.config.tasks().len());
        for task in self.config.tasks() {
            tasks.push(self.process_task(task, snapshot.as_ref()).await);
        }

        let report = PassReport {
            started_at_ms,
            duration_ms: self.time_provider.now_millis() - started_at_ms,
            snapshot_available: snapshot.is_some(),
            tasks,
        };

        info!(
            duration_ms = report.duration_ms,
            pushed = report.pushed_count(),
            failed = report.failed_count(),
            "Task pass completed"
        );
        report
    }

    async fn process_task(&self, task: &TaskDefinition, snapshot: Option<&Snapshot>) -> TaskOutcome {
        let variable = task.variable_name();
        info!(variable = %variable, "Executing command");

        let value = self.resolve_value(task).await;
        info!(variable = %variable, value = %value, "Command result");

        let outcome = if !needs_update(&value, variable, task.kind(), snapshot) {
            info!(variable = %variable, "Skip update");
            UpdateOutcome::Skipped
        } else if self.push(task, &value).await {
            info!(variable = %variable, value = %value, "Update succeeded");
            UpdateOutcome::Pushed
        } else {
            UpdateOutcome::PushFailed
        };

        TaskOutcome {
            variable_name: variable.to_string(),
            value,
            outcome,
        }
    }

    /// Fetch the snapshot, absence on any failure
    async fn fetch_snapshot(&self) -> Option<Snapshot> {
        match self.remote.fetch_snapshot().await {
            Ok(snapshot) => {
                info!(variables = snapshot.len(), "Fetched remote snapshot");
                Some(snapshot)
            }
            Err(e) => {
                error!(error = %e, "Failed to get current variable state");
                None
            }
        }
    }

    /// Execute the task's command, collapsing every failure to the sentinel
    async fn resolve_value(&self, task: &TaskDefinition) -> String {
        match self
            .executor
            .execute(task.command(), task.exec_timeout())
            .await
        {
            Ok(result) => result.value,
            Err(e) => {
                warn!(
                    variable = %task.variable_name(),
                    command = %task.command(),
                    error = %e,
                    "Command produced no usable output"
                );
                SENTINEL_VALUE.to_string()
            }
        }
    }

    /// Write the value, `false` on any failure
    async fn push(&self, task: &TaskDefinition, value: &str) -> bool {
        match self
            .remote
            .push_value(task.variable_name(), task.kind(), value)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                error!(
                    variable = %task.variable_name(),
                    value = %value,
                    error = %e,
                    "Update failed"
                );
                false
            }
        }
    }
}
