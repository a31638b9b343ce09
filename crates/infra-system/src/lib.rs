// Penguin Bridge Infrastructure - System Adapters
// Implements: CommandExecutor, interface/file probes

pub mod file_probe;
pub mod net_probe;
pub mod shell_executor;

pub use file_probe::{file_exists, format_exists, DEFAULT_WIFI_CONFIG_PATH};
pub use net_probe::{format_ipv4, interface_ipv4};
pub use shell_executor::ShellExecutor;
