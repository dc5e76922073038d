//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Storage collaborator failure (task, message, or push-config store).
    Storage(String),
    /// Requested task does not exist.
    TaskNotFound(String),
    /// Operation is not valid for the task's current state, e.g. sending
    /// input to a running task or canceling a completed one.
    UnsupportedOperation(String),
    /// Request parameters are structurally invalid or inconsistent.
    InvalidParams(String),
    /// Unexpected internal condition, such as a malformed event from the
    /// agent executor.
    Internal(String),
    /// Domain error raised by the agent executor, propagated unchanged.
    Agent(String),
    /// Push-notification delivery failure.
    Push(String),
}

impl AppError {
    /// Stable protocol error code for this variant.
    ///
    /// Transport layers embed this in their error envelope; codes follow
    /// the JSON-RPC convention with agent-protocol extensions in the
    /// `-32000` range.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::TaskNotFound(_) => -32001,
            Self::UnsupportedOperation(_) => -32004,
            Self::InvalidParams(_) => -32602,
            Self::Config(_)
            | Self::Storage(_)
            | Self::Internal(_)
            | Self::Agent(_)
            | Self::Push(_) => -32603,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Storage(msg) => write!(f, "storage: {msg}"),
            Self::TaskNotFound(msg) => write!(f, "task not found: {msg}"),
            Self::UnsupportedOperation(msg) => write!(f, "unsupported operation: {msg}"),
            Self::InvalidParams(msg) => write!(f, "invalid params: {msg}"),
            Self::Internal(msg) => write!(f, "internal: {msg}"),
            Self::Agent(msg) => write!(f, "agent: {msg}"),
            Self::Push(msg) => write!(f, "push: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("serialization: {err}"))
    }
}
