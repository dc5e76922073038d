//! Push-notification configuration models.

use serde::{Deserialize, Serialize};

/// A single push-notification target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PushNotificationConfig {
    /// Identifier for this target within a task; assigned by the store
    /// when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Webhook URL the final task snapshot is delivered to.
    pub url: String,
    /// Optional bearer token sent with the delivery.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Per-task push-notification registration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskPushConfig {
    /// Task the configuration applies to.
    pub task_id: String,
    /// The notification target.
    pub config: PushNotificationConfig,
}
