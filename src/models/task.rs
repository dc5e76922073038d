//! Task model and state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::message::{Message, Part};

/// Lifecycle state for a task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    /// Task accepted but not yet picked up by the agent.
    Submitted,
    /// Agent is actively working on the task.
    Working,
    /// Agent yielded and is waiting for further client input.
    InputRequired,
    /// Task finished successfully.
    Completed,
    /// Task finished with an error.
    Failed,
    /// Task was canceled before completion.
    Canceled,
}

impl TaskState {
    /// Whether this state is terminal. Terminal tasks never change state
    /// again.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Canceled)
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Submitted => "submitted",
            Self::Working => "working",
            Self::InputRequired => "input-required",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
        };
        f.write_str(name)
    }
}

/// Current status of a task: state plus an optional status message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    /// Lifecycle state.
    pub state: TaskState,
    /// Optional agent message describing the status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    /// When this status was entered.
    pub timestamp: DateTime<Utc>,
}

impl TaskStatus {
    /// Build a status for `state` stamped with the current time.
    #[must_use]
    pub fn new(state: TaskState) -> Self {
        Self {
            state,
            message: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach a status message.
    #[must_use]
    pub fn with_message(mut self, message: Message) -> Self {
        self.message = Some(message);
        self
    }
}

/// Output produced by the agent while working on a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// Unique artifact identifier within the task.
    pub id: String,
    /// Optional display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Ordered content parts.
    pub parts: Vec<Part>,
}

/// A persisted, versioned unit of work.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task identifier.
    pub id: String,
    /// Conversation this task belongs to.
    pub context_id: String,
    /// Current status.
    pub status: TaskStatus,
    /// Conversational history, oldest first.
    #[serde(default)]
    pub history: Vec<Message>,
    /// Artifacts produced so far.
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

impl Task {
    /// Build a freshly submitted task.
    #[must_use]
    pub fn new(id: impl Into<String>, context_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            context_id: context_id.into(),
            status: TaskStatus::new(TaskState::Submitted),
            history: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    /// Whether the task has reached a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.state.is_terminal()
    }

    /// Install a new status, moving the previous status message into
    /// history so no conversational turn is lost.
    pub fn apply_status(&mut self, status: TaskStatus) {
        if let Some(previous) = self.status.message.take() {
            self.history.push(previous);
        }
        self.status = status;
    }

    /// Merge an artifact update. The first chunk (`append == false`)
    /// replaces an artifact with the same id or adds a new one; subsequent
    /// chunks (`append == true`) extend the existing artifact's parts. An
    /// append for an unknown artifact id is dropped.
    pub fn apply_artifact(&mut self, artifact: Artifact, append: bool) {
        let existing = self.artifacts.iter_mut().find(|a| a.id == artifact.id);
        match (existing, append) {
            (Some(slot), false) => *slot = artifact,
            (Some(slot), true) => slot.parts.extend(artifact.parts),
            (None, false) => self.artifacts.push(artifact),
            (None, true) => {
                tracing::warn!(
                    task_id = %self.id,
                    artifact_id = %artifact.id,
                    "append chunk for unknown artifact dropped"
                );
            }
        }
    }

    /// Keep only the most recent `n` history entries when `history_length`
    /// is set; `None` keeps the full history.
    pub fn trim_history(&mut self, history_length: Option<usize>) {
        if let Some(max) = history_length {
            if self.history.len() > max {
                self.history.drain(..self.history.len() - max);
            }
        }
    }
}
