//! Message storage contract and in-memory reference implementation.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use parking_lot::Mutex;

use crate::models::message::Message;
use crate::{AppError, Result};

/// Storage collaborator owning conversational messages, grouped by
/// conversation.
pub trait MessageStore: Send + Sync {
    /// Append a message to its conversation. The message must carry a
    /// conversation id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidParams`] when the message has no
    /// conversation id, or [`AppError::Storage`] when the backend fails.
    fn append(&self, message: &Message) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// List all messages of a conversation in append order.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`] when the backend fails.
    fn list(
        &self,
        context_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Message>>> + Send + '_>>;
}

/// Reference implementation backed by a process-local map.
#[derive(Default)]
pub struct InMemoryMessageStore {
    messages: Mutex<HashMap<String, Vec<Message>>>,
}

impl InMemoryMessageStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl MessageStore for InMemoryMessageStore {
    fn append(&self, message: &Message) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let message = message.clone();
        Box::pin(async move {
            let Some(context_id) = message.context_id.clone() else {
                return Err(AppError::InvalidParams(
                    "message has no conversation id".into(),
                ));
            };
            self.messages
                .lock()
                .entry(context_id)
                .or_default()
                .push(message);
            Ok(())
        })
    }

    fn list(
        &self,
        context_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Message>>> + Send + '_>> {
        let context_id = context_id.to_owned();
        Box::pin(async move {
            let messages = self.messages.lock();
            Ok(messages.get(&context_id).cloned().unwrap_or_default())
        })
    }
}
