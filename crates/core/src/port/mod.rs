// Port Layer - Interfaces for external dependencies

pub mod command_executor;
pub mod remote_state;
pub mod ticker; // Drives passes; the runner never sees it
pub mod time_provider;

// Re-exports
pub use command_executor::{
    normalize_output, CommandExecutor, ExecutionError, ExecutionResult, ExecutionStatus,
};
pub use remote_state::{RemoteError, RemoteState};
pub use ticker::{IntervalTicker, Ticker};
pub use time_provider::{SystemTimeProvider, TimeProvider};
