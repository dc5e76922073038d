//! Protocol request handling: send, stream, query, cancel, resubscribe,
//! push-config CRUD, and card discovery.

use std::sync::Arc;

use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::RelayConfig;
use crate::executor::AgentExecutor;
use crate::models::card::AgentCard;
use crate::models::event::{Event, TaskEvent, TaskStatusUpdateEvent};
use crate::models::push::TaskPushConfig;
use crate::models::task::{Task, TaskState, TaskStatus};
use crate::orchestrator::{
    CallContext, EventProcessor, EventStream, RequestContext, Session, SessionManager,
};
use crate::persistence::{MessageStore, PushConfigStore, TaskStore};
use crate::push::PushSender;
use crate::protocol::params::{
    DeletePushConfigParams, GetPushConfigParams, MessageSendParams, SendMessageResult,
    TaskIdParams, TaskQueryParams,
};
use crate::{AppError, Result};

/// The protocol surface: validates requests, builds sessions, and streams
/// events back to clients. One instance serves arbitrarily many
/// concurrent callers.
pub struct ProtocolServer {
    card: AgentCard,
    executor: Arc<dyn AgentExecutor>,
    manager: Arc<SessionManager>,
    task_store: Arc<dyn TaskStore>,
    message_store: Arc<dyn MessageStore>,
    push_store: Arc<dyn PushConfigStore>,
}

impl ProtocolServer {
    /// Wire a server from its collaborators.
    #[must_use]
    pub fn new(
        config: &RelayConfig,
        executor: Arc<dyn AgentExecutor>,
        task_store: Arc<dyn TaskStore>,
        message_store: Arc<dyn MessageStore>,
        push_store: Arc<dyn PushConfigStore>,
        push_sender: Arc<dyn PushSender>,
    ) -> Self {
        let manager = Arc::new(SessionManager::new(
            Arc::clone(&task_store),
            Arc::clone(&push_store),
            push_sender,
        ));
        Self {
            card: config.agent_card(),
            executor,
            manager,
            task_store,
            message_store,
            push_store,
        }
    }

    /// The session manager, exposed for embedding layers that need
    /// registry introspection.
    #[must_use]
    pub fn manager(&self) -> &Arc<SessionManager> {
        &self.manager
    }

    /// Discovery operation: the configured agent card.
    #[must_use]
    pub fn agent_card(&self) -> &AgentCard {
        &self.card
    }

    /// Send a message and resolve a single response.
    ///
    /// With `configuration.blocking` set, drives the stream to completion
    /// and resolves the last event: a full task snapshot (history and
    /// artifacts included) when the last event was task-related, the
    /// message itself otherwise. Without it, resolves the first event,
    /// which must be a message or a task snapshot.
    ///
    /// # Errors
    ///
    /// Everything [`send_message_streaming`](Self::send_message_streaming)
    /// fails with, plus [`AppError::TaskNotFound`] when the task vanished
    /// before resolution and [`AppError::Internal`] when the stream shape
    /// is not resolvable.
    pub async fn send_message(
        &self,
        params: MessageSendParams,
        call: &CallContext,
    ) -> Result<SendMessageResult> {
        let configuration = params.configuration.clone().unwrap_or_default();
        let mut events = self.send_message_streaming(params, call).await?;

        if configuration.blocking {
            let mut last = None;
            while let Some(event) = events.recv().await {
                last = Some(event);
            }
            match last {
                Some(Event::Message(message)) => Ok(SendMessageResult::Message(message)),
                Some(Event::Task(event)) => {
                    let task = self
                        .task_store
                        .get(event.task_id(), configuration.history_length, true)
                        .await?
                        .ok_or_else(|| AppError::TaskNotFound(event.task_id().to_owned()))?;
                    Ok(SendMessageResult::Task(task))
                }
                None => Err(AppError::Internal(
                    "agent produced no events before closing the stream".into(),
                )),
            }
        } else {
            match events.recv().await {
                Some(Event::Message(message)) => Ok(SendMessageResult::Message(message)),
                Some(Event::Task(TaskEvent::Snapshot(task))) => Ok(SendMessageResult::Task(task)),
                Some(event) => Err(AppError::Internal(format!(
                    "unexpected first event shape for task {:?}",
                    event.task_id()
                ))),
                None => Err(AppError::Internal(
                    "agent produced no events before closing the stream".into(),
                )),
            }
        }
    }

    /// Send a message and stream every session event back in emission
    /// order, from registration until the processor closes.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::UnsupportedOperation`] when the referenced
    /// task already has a running session, [`AppError::TaskNotFound`]
    /// when the referenced task does not exist, and
    /// [`AppError::InvalidParams`] when the message's conversation id
    /// does not match the task's. All validation happens before any
    /// session is registered; no partial state is left behind on failure.
    pub async fn send_message_streaming(
        &self,
        params: MessageSendParams,
        call: &CallContext,
    ) -> Result<EventStream> {
        let mut message = params.message;

        let (context_id, task_id, existing_task) = if let Some(task_id) = message.task_id.clone() {
            // A task may not receive new input while it is executing.
            if self.manager.session_for_task(&task_id).await.is_some() {
                return Err(AppError::UnsupportedOperation(format!(
                    "task {task_id} is already running and cannot accept new input"
                )));
            }
            let task = self
                .task_store
                .get(&task_id, None, true)
                .await?
                .ok_or_else(|| AppError::TaskNotFound(task_id.clone()))?;
            if let Some(context_id) = &message.context_id {
                if context_id != &task.context_id {
                    return Err(AppError::InvalidParams(format!(
                        "message conversation {context_id} does not match task conversation {}",
                        task.context_id
                    )));
                }
            }
            (task.context_id.clone(), task_id, Some(task))
        } else {
            let context_id = message
                .context_id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            (context_id, Uuid::new_v4().to_string(), None)
        };

        message.context_id = Some(context_id.clone());
        message.task_id = Some(task_id.clone());

        let processor = match &existing_task {
            Some(task) => Arc::new(EventProcessor::for_task(
                task,
                Arc::clone(&self.task_store),
            )),
            None => Arc::new(EventProcessor::new(
                context_id.clone(),
                task_id.clone(),
                Arc::clone(&self.task_store),
            )),
        };

        let context = RequestContext::new(
            context_id.clone(),
            task_id.clone(),
            Some(message),
            existing_task,
            call.clone(),
            Arc::clone(&self.message_store),
            Arc::clone(&self.task_store),
        );

        let job = {
            let executor = Arc::clone(&self.executor);
            let events = Arc::clone(&processor);
            let task_id = task_id.clone();
            async move {
                if let Err(err) = executor.execute(context, events).await {
                    // The stream just ends; the error is not translated.
                    error!(task_id, %err, "agent execution failed");
                }
            }
        };
        let session = Arc::new(Session::new(context_id, task_id, processor, job));

        // Duplicate registration fails here, before any work starts.
        self.manager.add_session(Arc::clone(&session)).await?;
        let events = session.processor().subscribe();
        session.start();
        debug!(task_id = %session.task_id(), "session started");
        Ok(events)
    }

    /// Load a task snapshot with the requested history depth.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::TaskNotFound`] when the task does not exist.
    pub async fn get_task(&self, params: &TaskQueryParams) -> Result<Task> {
        self.task_store
            .get(&params.id, params.history_length, true)
            .await?
            .ok_or_else(|| AppError::TaskNotFound(params.id.clone()))
    }

    /// Cancel a task.
    ///
    /// With no session registered, the stored task is transitioned
    /// directly: canceling an already-Canceled task is an idempotent
    /// success, canceling any other terminal task is rejected. With a
    /// live session, the executor's cancel hook runs first and the
    /// session is closed afterwards regardless of whether the hook
    /// already did so. Either way the task's latest snapshot is
    /// re-read and returned.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::TaskNotFound`] when the task does not exist,
    /// [`AppError::UnsupportedOperation`] when it is terminal and not
    /// canceled, and any error of the executor's cancel hook unchanged —
    /// in that case the task keeps running.
    pub async fn cancel_task(&self, params: &TaskIdParams, call: &CallContext) -> Result<Task> {
        match self.manager.session_for_task(&params.id).await {
            None => {
                let task = self
                    .task_store
                    .get(&params.id, None, true)
                    .await?
                    .ok_or_else(|| AppError::TaskNotFound(params.id.clone()))?;
                if task.status.state == TaskState::Canceled {
                    return Ok(task);
                }
                if task.is_terminal() {
                    return Err(AppError::UnsupportedOperation(format!(
                        "task {} is {} and cannot be canceled",
                        task.id, task.status.state
                    )));
                }
                let update = TaskEvent::Status(TaskStatusUpdateEvent {
                    task_id: task.id.clone(),
                    context_id: task.context_id.clone(),
                    status: TaskStatus::new(TaskState::Canceled),
                    is_final: true,
                });
                self.task_store.update(&update).await?;
                info!(task_id = %task.id, "stored task canceled");
            }
            Some(session) => {
                let context = RequestContext::new(
                    session.context_id(),
                    session.task_id(),
                    None,
                    self.task_store.get(&params.id, None, true).await?,
                    call.clone(),
                    Arc::clone(&self.message_store),
                    Arc::clone(&self.task_store),
                );
                // A hook error means cancellation failed; the session and
                // task are left exactly as they were.
                self.executor
                    .cancel(context, Arc::clone(&session))
                    .await?;
                // The hook may have closed the session already; closing
                // again guarantees termination either way. The per-task
                // lock serializes this against the completion monitor's
                // finalization of the same task.
                self.manager
                    .with_task_lock(session.task_id(), || async {
                        session.close().await;
                    })
                    .await;
                info!(task_id = %session.task_id(), "running session canceled");
            }
        }

        self.task_store
            .get(&params.id, None, true)
            .await?
            .ok_or_else(|| AppError::TaskNotFound(params.id.clone()))
    }

    /// Attach to the live event stream of a running task, from this
    /// moment onward. No historical replay.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::UnsupportedOperation`] when no session is
    /// registered for the task.
    pub async fn resubscribe_task(&self, params: &TaskIdParams) -> Result<EventStream> {
        let session = self
            .manager
            .session_for_task(&params.id)
            .await
            .ok_or_else(|| {
                AppError::UnsupportedOperation(format!(
                    "task {} has no running session to resubscribe to",
                    params.id
                ))
            })?;
        Ok(session.processor().subscribe())
    }

    /// Register or replace a push-notification target for a task.
    ///
    /// # Errors
    ///
    /// Returns the storage error unchanged.
    pub async fn set_push_config(&self, config: &TaskPushConfig) -> Result<TaskPushConfig> {
        self.push_store.set(config).await
    }

    /// Look up one push-notification registration.
    ///
    /// # Errors
    ///
    /// Returns the storage error unchanged.
    pub async fn get_push_config(
        &self,
        params: &GetPushConfigParams,
    ) -> Result<Option<TaskPushConfig>> {
        self.push_store.get(&params.task_id, &params.config_id).await
    }

    /// All push-notification registrations for a task.
    ///
    /// # Errors
    ///
    /// Returns the storage error unchanged.
    pub async fn list_push_configs(&self, params: &TaskIdParams) -> Result<Vec<TaskPushConfig>> {
        self.push_store.get_all(&params.id).await
    }

    /// Remove one push-notification registration.
    ///
    /// # Errors
    ///
    /// Returns the storage error unchanged.
    pub async fn delete_push_config(&self, params: &DeletePushConfigParams) -> Result<()> {
        self.push_store
            .delete(&params.task_id, &params.config_id)
            .await
    }
}
