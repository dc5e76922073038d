//! Request and response payloads for the protocol operations.

use serde::{Deserialize, Serialize};

use crate::models::message::Message;
use crate::models::task::Task;

/// Options controlling a send-message call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageSendConfiguration {
    /// Drive the task to completion before responding.
    #[serde(default)]
    pub blocking: bool,
    /// Limit history depth in the resolved task snapshot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_length: Option<usize>,
}

/// Parameters for the send-message operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageSendParams {
    /// The inbound message.
    pub message: Message,
    /// Optional send options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<MessageSendConfiguration>,
}

/// Parameters for the get-task operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskQueryParams {
    /// Task to load.
    pub id: String,
    /// Limit history depth in the returned snapshot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_length: Option<usize>,
}

/// Parameters addressing a task by id alone (cancel, resubscribe).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskIdParams {
    /// Task to address.
    pub id: String,
}

/// Parameters selecting one push-notification registration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GetPushConfigParams {
    /// Task the registration belongs to.
    pub task_id: String,
    /// Registration to load.
    pub config_id: String,
}

/// Parameters removing one push-notification registration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeletePushConfigParams {
    /// Task the registration belongs to.
    pub task_id: String,
    /// Registration to remove.
    pub config_id: String,
}

/// Result of a non-streaming send-message call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SendMessageResult {
    /// The agent answered with a plain message, no task involved.
    Message(Message),
    /// The agent worked a task; this is its resolved snapshot.
    Task(Task),
}
