use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How a second outstanding request for the same site and operation is
/// treated while the first is still awaiting its response signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutstandingPolicy {
    /// The new request supersedes the old one; the old listener is
    /// retired and only the new exchange is answered. Keeps the "one
    /// outstanding request per site per operation" contract.
    #[default]
    Replace,
    /// The new request is answered immediately with an error and the
    /// original exchange continues undisturbed.
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Unix socket the host listens on. Absent when the embedder wires
    /// its own channel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socket_path: Option<PathBuf>,

    /// Seconds to wait for a response signal before answering the host
    /// with a timeout error. 0 disables the timeout.
    #[serde(default = "default_response_timeout_secs")]
    pub response_timeout_secs: u64,

    /// Duplicate outstanding-request handling
    #[serde(default)]
    pub outstanding_policy: OutstandingPolicy,
}

fn default_response_timeout_secs() -> u64 {
    30
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            socket_path: None,
            response_timeout_secs: default_response_timeout_secs(),
            outstanding_policy: OutstandingPolicy::default(),
        }
    }
}

impl BridgeConfig {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BridgeConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The configured response timeout, `None` when disabled.
    pub fn response_timeout(&self) -> Option<Duration> {
        match self.response_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
