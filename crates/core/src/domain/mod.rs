// Domain Layer - Task definitions, configuration and remote state

pub mod config;
pub mod error;
pub mod snapshot;
pub mod task;

// Re-exports
pub use config::{BridgeConfig, DEFAULT_MACRO_NAME};
pub use error::ConfigError;
pub use snapshot::{Snapshot, VariableValue};
pub use task::{TaskDefinition, ValueKind};
