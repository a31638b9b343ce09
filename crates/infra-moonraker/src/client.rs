// Moonraker client implementation
// reason: reqwest for HTTP, async-trait for the RemoteState port
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use std::time::Duration;
use tracing::{debug, warn};

use penguin_bridge_core::domain::{BridgeConfig, Snapshot, ValueKind};
use penguin_bridge_core::port::{RemoteError, RemoteState};

use crate::error::MoonrakerError;
use crate::protocol::{self, CommandRequest};

const JSON_CONTENT: &str = "application/json";

/// Moonraker HTTP client bound to one macro group
///
/// Every request (read or write) is bounded by the configured API timeout
/// and attempted exactly once.
pub struct MoonrakerClient {
    client: reqwest::Client,
    base_url: String,
    macro_name: String,
}

impl MoonrakerClient {
    /// Create a client for the host, port, timeout and macro group of `config`
    pub fn new(config: &BridgeConfig) -> Result<Self, MoonrakerError> {
        Self::with_base_url(config.base_url(), config.macro_name(), config.api_timeout())
    }

    /// Create a client against an explicit base URL (`http://host:port`)
    pub fn with_base_url(
        base_url: impl Into<String>,
        macro_name: impl Into<String>,
        api_timeout: Duration,
    ) -> Result<Self, MoonrakerError> {
        let client = reqwest::Client::builder().timeout(api_timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            macro_name: macro_name.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn macro_name(&self) -> &str {
        &self.macro_name
    }
}

/// Map a transport failure onto the port's error type
fn classify(e: reqwest::Error) -> RemoteError {
    if e.is_timeout() {
        RemoteError::Timeout
    } else if e.is_decode() || e.is_body() {
        RemoteError::MalformedResponse(e.to_string())
    } else {
        RemoteError::Unreachable(e.to_string())
    }
}

#[async_trait]
impl RemoteState for MoonrakerClient {
    async fn fetch_snapshot(&self) -> Result<Snapshot, RemoteError> {
        let url = protocol::query_url(&self.base_url, &self.macro_name);
        debug!(url = %url, "Querying macro variables");

        let response = self.client.get(&url).send().await.map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = %status, "Variable query rejected");
            return Err(RemoteError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(classify)?;
        protocol::parse_snapshot(&body, &self.macro_name)
    }

    async fn push_value(
        &self,
        variable_name: &str,
        kind: ValueKind,
        value: &str,
    ) -> Result<(), RemoteError> {
        let command = protocol::set_variable_command(&self.macro_name, variable_name, kind, value);
        debug!(command = %command, "Sending G-code command");

        let response = self
            .client
            .post(protocol::command_url(&self.base_url))
            .header(ACCEPT, JSON_CONTENT)
            .json(&CommandRequest {
                commands: vec![command],
            })
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            warn!(variable = %variable_name, status = %status, "Variable update rejected");
            return Err(RemoteError::Status(status.as_u16()));
        }
        Ok(())
    }
}
