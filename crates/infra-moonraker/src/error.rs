use thiserror::Error;

/// Errors raised while setting up the adapter (request failures are
/// reported through `RemoteError`)
#[derive(Error, Debug)]
pub enum MoonrakerError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),
}
