// Task Domain Model

use std::time::Duration;

use super::error::{ConfigError, Result};

/// How a task's output is interpreted and written back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Parsed as a float for diffing, written as a bare literal
    Number,
    /// Compared verbatim, written as a quoted string literal
    Text,
}

impl ValueKind {
    pub fn from_is_number(is_number: bool) -> Self {
        if is_number {
            ValueKind::Number
        } else {
            ValueKind::Text
        }
    }

    pub fn is_number(self) -> bool {
        matches!(self, ValueKind::Number)
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueKind::Number => write!(f, "NUMBER"),
            ValueKind::Text => write!(f, "TEXT"),
        }
    }
}

/// One configured unit of work, immutable after validation.
///
/// `variable_name` is the key used both for reading the remote snapshot
/// and for writing the value back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDefinition {
    command: String,
    exec_timeout: Duration,
    variable_name: String,
    kind: ValueKind,
}

impl TaskDefinition {
    /// Create a validated task
    ///
    /// # Errors
    /// - ConfigError::InvalidField if command or variable name is empty,
    ///   or the timeout is zero
    pub fn new(
        command: impl Into<String>,
        exec_timeout: Duration,
        variable_name: impl Into<String>,
        kind: ValueKind,
    ) -> Result<Self> {
        let command = command.into();
        let variable_name = variable_name.into();

        if command.is_empty() {
            return Err(ConfigError::invalid("command", "must not be empty"));
        }
        if variable_name.is_empty() {
            return Err(ConfigError::invalid("variableName", "must not be empty"));
        }
        if exec_timeout.is_zero() {
            return Err(ConfigError::invalid("execTimeout", "must be positive"));
        }

        Ok(Self {
            command,
            exec_timeout,
            variable_name,
            kind,
        })
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn exec_timeout(&self) -> Duration {
        self.exec_timeout
    }

    pub fn variable_name(&self) -> &str {
        &self.variable_name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn is_number(&self) -> bool {
        self.kind.is_number()
    }
}
