//! Configuration parsing and validation.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::models::card::{AgentCapabilities, AgentCard};
use crate::{AppError, Result};

/// Identity and capabilities advertised through the agent card.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct AgentConfig {
    /// Human-readable agent name.
    #[serde(default = "default_agent_name")]
    pub name: String,
    /// Short description of what the agent does.
    #[serde(default)]
    pub description: String,
    /// Implementation version published in the card.
    #[serde(default = "default_agent_version")]
    pub version: String,
    /// Base URL where the agent is reachable.
    #[serde(default = "default_agent_url")]
    pub url: String,
    /// Whether the streaming operation is advertised.
    #[serde(default = "default_true")]
    pub streaming: bool,
    /// Whether push-notification configuration is advertised.
    #[serde(default = "default_true")]
    pub push_notifications: bool,
}

fn default_agent_name() -> String {
    "agent-relay".into()
}

fn default_agent_version() -> String {
    env!("CARGO_PKG_VERSION").into()
}

fn default_agent_url() -> String {
    "http://localhost:8080".into()
}

fn default_true() -> bool {
    true
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            description: String::new(),
            version: default_agent_version(),
            url: default_agent_url(),
            streaming: true,
            push_notifications: true,
        }
    }
}

/// Push-notification delivery tuning.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct PushDeliveryConfig {
    /// Per-delivery HTTP timeout.
    #[serde(default = "default_push_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

fn default_push_timeout_seconds() -> u64 {
    30
}

impl Default for PushDeliveryConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: default_push_timeout_seconds(),
        }
    }
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct RelayConfig {
    /// Agent identity and capabilities.
    #[serde(default)]
    pub agent: AgentConfig,
    /// Push delivery tuning.
    #[serde(default)]
    pub push: PushDeliveryConfig,
}

impl RelayConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the TOML is invalid or validation
    /// fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// The agent card this configuration describes.
    #[must_use]
    pub fn agent_card(&self) -> AgentCard {
        AgentCard {
            name: self.agent.name.clone(),
            description: self.agent.description.clone(),
            version: self.agent.version.clone(),
            url: self.agent.url.clone(),
            capabilities: AgentCapabilities {
                streaming: self.agent.streaming,
                push_notifications: self.agent.push_notifications,
            },
        }
    }

    fn validate(&self) -> Result<()> {
        if self.agent.name.trim().is_empty() {
            return Err(AppError::Config("agent.name must not be empty".into()));
        }
        if self.agent.url.trim().is_empty() {
            return Err(AppError::Config("agent.url must not be empty".into()));
        }
        if self.push.request_timeout_seconds == 0 {
            return Err(AppError::Config(
                "push.request_timeout_seconds must be positive".into(),
            ));
        }
        Ok(())
    }
}
