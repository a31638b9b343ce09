// Bridge constants (no magic values)

/// Value standing in for "no usable output" from a command
pub const SENTINEL_VALUE: &str = "none";

/// Default config file location, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "./config.json";

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "PENGUIN_BRIDGE_CONFIG";

/// Default tracing filter for the binaries
pub const DEFAULT_LOG_FILTER: &str = "penguin_bridge=info";
