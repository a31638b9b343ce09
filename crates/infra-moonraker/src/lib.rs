// Penguin Bridge Infrastructure - Moonraker Adapter
// Implements: RemoteState over the Moonraker HTTP API

pub mod client;
pub mod error;
pub mod protocol;

pub use client::MoonrakerClient;
pub use error::MoonrakerError;
