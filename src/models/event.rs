//! Session event union: conversational messages and task updates.

use serde::{Deserialize, Serialize};

use super::message::Message;
use super::task::{Artifact, Task, TaskStatus};

/// Incremental status change for a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusUpdateEvent {
    /// Task being updated.
    pub task_id: String,
    /// Conversation the task belongs to.
    pub context_id: String,
    /// New status.
    pub status: TaskStatus,
    /// Whether this is the last status update the agent will emit.
    #[serde(rename = "final")]
    pub is_final: bool,
}

/// Incremental artifact chunk for a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskArtifactUpdateEvent {
    /// Task being updated.
    pub task_id: String,
    /// Conversation the task belongs to.
    pub context_id: String,
    /// Artifact content for this chunk.
    pub artifact: Artifact,
    /// Whether this chunk extends a previously sent artifact.
    #[serde(default)]
    pub append: bool,
    /// Whether this is the final chunk of the artifact.
    #[serde(default)]
    pub last_chunk: bool,
}

/// Task-related event: a full snapshot or an incremental update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TaskEvent {
    /// Complete task snapshot.
    #[serde(rename = "task")]
    Snapshot(Task),
    /// Status change.
    #[serde(rename = "status-update")]
    Status(TaskStatusUpdateEvent),
    /// Artifact chunk.
    #[serde(rename = "artifact-update")]
    Artifact(TaskArtifactUpdateEvent),
}

impl TaskEvent {
    /// The task this event applies to.
    #[must_use]
    pub fn task_id(&self) -> &str {
        match self {
            Self::Snapshot(task) => &task.id,
            Self::Status(update) => &update.task_id,
            Self::Artifact(update) => &update.task_id,
        }
    }

    /// The conversation the task belongs to.
    #[must_use]
    pub fn context_id(&self) -> &str {
        match self {
            Self::Snapshot(task) => &task.context_id,
            Self::Status(update) => &update.context_id,
            Self::Artifact(update) => &update.context_id,
        }
    }
}

/// Everything a session can emit, consumed by subscribers in emission
/// order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Event {
    /// A conversational turn.
    Message(Message),
    /// A task snapshot or update.
    Task(TaskEvent),
}

impl Event {
    /// The task this event is tied to, when any.
    #[must_use]
    pub fn task_id(&self) -> Option<&str> {
        match self {
            Self::Message(message) => message.task_id.as_deref(),
            Self::Task(event) => Some(event.task_id()),
        }
    }

    /// Whether this event carries task state.
    #[must_use]
    pub fn is_task_event(&self) -> bool {
        matches!(self, Self::Task(_))
    }
}
