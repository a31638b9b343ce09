// Application Layer - Use Cases and Business Logic

pub mod constants;
pub mod diff;
pub mod runner;
pub mod scheduler;
pub mod shutdown;

// Re-exports
pub use diff::needs_update;
pub use runner::{PassReport, TaskOutcome, TaskRunner, UpdateOutcome};
pub use scheduler::PassScheduler;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
