//! Conversational message model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Author of a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Message sent by the client on behalf of a user.
    User,
    /// Message produced by the agent.
    Agent,
}

/// One content part of a message or artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Part {
    /// Plain text content.
    Text {
        /// The text payload.
        text: String,
    },
    /// Reference to a file by URI.
    File {
        /// Optional display name.
        name: Option<String>,
        /// Location of the file content.
        uri: String,
    },
    /// Structured JSON content.
    Data {
        /// Arbitrary structured payload.
        data: serde_json::Value,
    },
}

impl Part {
    /// Build a text part.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// A single conversational turn, optionally tied to a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique message identifier.
    pub id: String,
    /// Author of the message.
    pub role: Role,
    /// Ordered content parts.
    pub parts: Vec<Part>,
    /// Conversation this message belongs to, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
    /// Task this message belongs to, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

impl Message {
    /// Build a user text message with a generated identifier.
    #[must_use]
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Build an agent text message with a generated identifier.
    #[must_use]
    pub fn agent_text(text: impl Into<String>) -> Self {
        Self::new(Role::Agent, text)
    }

    fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            parts: vec![Part::text(text)],
            context_id: None,
            task_id: None,
        }
    }

    /// Attach a conversation identifier.
    #[must_use]
    pub fn with_context_id(mut self, context_id: impl Into<String>) -> Self {
        self.context_id = Some(context_id.into());
        self
    }

    /// Attach a task identifier.
    #[must_use]
    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    /// Concatenated text of all text parts, separated by newlines.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            if let Part::Text { text } = part {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(text);
            }
        }
        out
    }
}
