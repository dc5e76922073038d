//! Agent card served by the discovery operation.

use serde::{Deserialize, Serialize};

/// Optional protocol features this server advertises.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AgentCapabilities {
    /// Server supports the streaming message operation.
    pub streaming: bool,
    /// Server supports push-notification configuration.
    pub push_notifications: bool,
}

/// Self-description published to clients for discovery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    /// Human-readable agent name.
    pub name: String,
    /// Short description of what the agent does.
    pub description: String,
    /// Implementation version.
    pub version: String,
    /// Base URL where the agent is reachable.
    pub url: String,
    /// Advertised capabilities.
    pub capabilities: AgentCapabilities,
}
