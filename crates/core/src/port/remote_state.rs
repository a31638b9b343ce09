// Remote State Port
// Abstraction over the printer host's runtime variable store

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Snapshot, ValueKind};

/// Remote read/write errors
///
/// Never escape a pass: a failed read becomes "no snapshot", a failed write
/// becomes `false`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Remote unreachable: {0}")]
    Unreachable(String),

    #[error("Remote request timed out")]
    Timeout,

    #[error("Remote returned HTTP {0}")]
    Status(u16),

    #[error("Malformed remote response: {0}")]
    MalformedResponse(String),
}

/// Remote State trait
///
/// Implementations:
/// - MoonrakerClient: Moonraker HTTP API (`penguin-bridge-infra-moonraker`)
#[async_trait]
pub trait RemoteState: Send + Sync {
    /// Read the current variables of the bridge's macro group
    ///
    /// # Errors
    /// - RemoteError::Unreachable / Timeout on network failure
    /// - RemoteError::Status on a non-2xx response
    /// - RemoteError::MalformedResponse if the body has the wrong shape
    async fn fetch_snapshot(&self) -> Result<Snapshot, RemoteError>;

    /// Set one variable of the macro group
    ///
    /// `value` is written as a bare literal for `ValueKind::Number` and as a
    /// quoted string literal for `ValueKind::Text`.
    async fn push_value(
        &self,
        variable_name: &str,
        kind: ValueKind,
        value: &str,
    ) -> Result<(), RemoteError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::VariableValue;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    /// One recorded `push_value` call
    #[derive(Debug, Clone, PartialEq)]
    pub struct PushCall {
        pub variable_name: String,
        pub kind: ValueKind,
        pub value: String,
    }

    /// Mock RemoteState for testing
    ///
    /// Holds an optional snapshot (None = fetch fails), records every push
    /// and, on a successful push, applies the value to its snapshot the way
    /// the printer would.
    pub struct MockRemoteState {
        snapshot: Arc<Mutex<Option<Snapshot>>>,
        pushes: Arc<Mutex<Vec<PushCall>>>,
        rejected: Arc<Mutex<HashSet<String>>>,
        fetch_count: Arc<Mutex<usize>>,
    }

    impl MockRemoteState {
        pub fn new(snapshot: Snapshot) -> Self {
            Self {
                snapshot: Arc::new(Mutex::new(Some(snapshot))),
                pushes: Arc::new(Mutex::new(Vec::new())),
                rejected: Arc::new(Mutex::new(HashSet::new())),
                fetch_count: Arc::new(Mutex::new(0)),
            }
        }

        /// A remote whose snapshot can never be fetched
        pub fn new_unavailable() -> Self {
            let mock = Self::new(Snapshot::new());
            *mock.snapshot.lock().unwrap() = None;
            mock
        }

        /// Answer pushes for `variable_name` with HTTP 500
        pub fn reject_pushes_for(self, variable_name: impl Into<String>) -> Self {
            self.rejected.lock().unwrap().insert(variable_name.into());
            self
        }

        pub fn pushes(&self) -> Vec<PushCall> {
            self.pushes.lock().unwrap().clone()
        }

        pub fn push_count(&self) -> usize {
            self.pushes.lock().unwrap().len()
        }

        pub fn fetch_count(&self) -> usize {
            *self.fetch_count.lock().unwrap()
        }

        pub fn snapshot(&self) -> Option<Snapshot> {
            self.snapshot.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RemoteState for MockRemoteState {
        async fn fetch_snapshot(&self) -> Result<Snapshot, RemoteError> {
            *self.fetch_count.lock().unwrap() += 1;
            self.snapshot
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| RemoteError::Unreachable("mock remote is down".to_string()))
        }

        async fn push_value(
            &self,
            variable_name: &str,
            kind: ValueKind,
            value: &str,
        ) -> Result<(), RemoteError> {
            self.pushes.lock().unwrap().push(PushCall {
                variable_name: variable_name.to_string(),
                kind,
                value: value.to_string(),
            });

            if self.rejected.lock().unwrap().contains(variable_name) {
                return Err(RemoteError::Status(500));
            }

            let stored = match kind {
                ValueKind::Number => value
                    .trim()
                    .parse::<f64>()
                    .map(VariableValue::Number)
                    .map_err(|e| RemoteError::MalformedResponse(e.to_string()))?,
                ValueKind::Text => VariableValue::Text(value.to_string()),
            };
            if let Some(snapshot) = self.snapshot.lock().unwrap().as_mut() {
                snapshot.insert(variable_name, stored);
            }
            Ok(())
        }
    }
}
