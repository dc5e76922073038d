//! Immutable per-request context handed to the agent executor.

use std::collections::HashMap;
use std::sync::Arc;

use crate::models::message::Message;
use crate::models::task::Task;
use crate::persistence::{MessageStore, TaskStore};
use crate::Result;

/// Caller identity attached to a protocol request. Authentication itself
/// happens upstream; this only carries what the transport established.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    /// Authenticated principal, when the transport established one.
    pub principal: Option<String>,
    /// Transport-defined key/value pairs.
    pub metadata: HashMap<String, String>,
}

impl CallContext {
    /// Context for an unauthenticated caller.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Context for a named principal.
    #[must_use]
    pub fn for_principal(principal: impl Into<String>) -> Self {
        Self {
            principal: Some(principal.into()),
            metadata: HashMap::new(),
        }
    }
}

/// Conversation-scoped view over a [`MessageStore`]: appends stamp the
/// conversation id, lists are filtered to it.
#[derive(Clone)]
pub struct ScopedMessageStore {
    context_id: String,
    store: Arc<dyn MessageStore>,
}

impl ScopedMessageStore {
    /// Scope `store` to one conversation.
    #[must_use]
    pub fn new(context_id: impl Into<String>, store: Arc<dyn MessageStore>) -> Self {
        Self {
            context_id: context_id.into(),
            store,
        }
    }

    /// The conversation this view is scoped to.
    #[must_use]
    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    /// Append a message to this conversation, overriding any conversation
    /// id the message already carried.
    ///
    /// # Errors
    ///
    /// Returns the underlying store error unchanged.
    pub async fn append(&self, mut message: Message) -> Result<()> {
        message.context_id = Some(self.context_id.clone());
        self.store.append(&message).await
    }

    /// All messages of this conversation in append order.
    ///
    /// # Errors
    ///
    /// Returns the underlying store error unchanged.
    pub async fn list(&self) -> Result<Vec<Message>> {
        self.store.list(&self.context_id).await
    }
}

/// Immutable bundle handed to the agent executor for one request.
#[derive(Clone)]
pub struct RequestContext {
    context_id: String,
    task_id: String,
    message: Option<Message>,
    task: Option<Task>,
    call: CallContext,
    messages: ScopedMessageStore,
    tasks: Arc<dyn TaskStore>,
}

impl RequestContext {
    /// Assemble a context. `message` is absent for cancellation requests;
    /// `task` is present when the request addresses an existing task.
    #[must_use]
    pub fn new(
        context_id: impl Into<String>,
        task_id: impl Into<String>,
        message: Option<Message>,
        task: Option<Task>,
        call: CallContext,
        message_store: Arc<dyn MessageStore>,
        tasks: Arc<dyn TaskStore>,
    ) -> Self {
        let context_id = context_id.into();
        let messages = ScopedMessageStore::new(context_id.clone(), message_store);
        Self {
            context_id,
            task_id: task_id.into(),
            message,
            task,
            call,
            messages,
            tasks,
        }
    }

    /// Conversation this request belongs to.
    #[must_use]
    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    /// Task this request addresses or allocates.
    #[must_use]
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// The inbound message, when the request carried one.
    #[must_use]
    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref()
    }

    /// Snapshot of the existing task, when the request addressed one.
    #[must_use]
    pub fn task(&self) -> Option<&Task> {
        self.task.as_ref()
    }

    /// Caller identity established by the transport.
    #[must_use]
    pub fn call(&self) -> &CallContext {
        &self.call
    }

    /// Conversation-scoped message storage.
    #[must_use]
    pub fn messages(&self) -> &ScopedMessageStore {
        &self.messages
    }

    /// Task storage, for executors that read related task state.
    #[must_use]
    pub fn tasks(&self) -> &Arc<dyn TaskStore> {
        &self.tasks
    }

    /// Concatenated text of the inbound message, empty when there is
    /// none.
    #[must_use]
    pub fn user_input(&self) -> String {
        self.message.as_ref().map(Message::text).unwrap_or_default()
    }
}
