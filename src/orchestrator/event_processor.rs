//! Per-session event bus with storage mirroring.
//!
//! Events published here reach every live subscriber in emission order
//! and, for task events, are merged into the task store first so a
//! consumer reacting to an event always observes storage at least as new
//! as the event itself.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::Stream;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

use crate::models::event::{Event, TaskEvent};
use crate::models::message::Message;
use crate::models::task::Task;
use crate::persistence::TaskStore;
use crate::Result;

/// Live view of one session's events, from the moment of subscription
/// onward. Ends cleanly when the processor closes.
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventStream {
    /// Receive the next event; `None` once the processor has closed and
    /// all buffered events were consumed.
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

impl Stream for EventStream {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        self.rx.poll_recv(cx)
    }
}

struct Subscribers {
    senders: Vec<mpsc::UnboundedSender<Event>>,
    closed: bool,
}

/// Append-only, multi-subscriber event bus bound to one conversation and
/// one task.
pub struct EventProcessor {
    context_id: String,
    task_id: String,
    store: Arc<dyn TaskStore>,
    // Short synchronous critical sections only; no await while held.
    subscribers: Mutex<Subscribers>,
}

impl EventProcessor {
    /// Build a processor for a fresh conversation/task pair.
    #[must_use]
    pub fn new(
        context_id: impl Into<String>,
        task_id: impl Into<String>,
        store: Arc<dyn TaskStore>,
    ) -> Self {
        Self {
            context_id: context_id.into(),
            task_id: task_id.into(),
            store,
            subscribers: Mutex::new(Subscribers {
                senders: Vec::new(),
                closed: false,
            }),
        }
    }

    /// Build a processor pre-seeded with an existing task's identifiers.
    #[must_use]
    pub fn for_task(task: &Task, store: Arc<dyn TaskStore>) -> Self {
        Self::new(task.context_id.clone(), task.id.clone(), store)
    }

    /// Conversation this processor belongs to.
    #[must_use]
    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    /// Task this processor belongs to.
    #[must_use]
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Attach a new subscriber. A subscription opened after [`close`]
    /// yields an immediately-ended stream.
    ///
    /// [`close`]: Self::close
    #[must_use]
    pub fn subscribe(&self) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscribers = self.subscribers.lock();
        if !subscribers.closed {
            subscribers.senders.push(tx);
        }
        EventStream { rx }
    }

    /// Publish a conversational message to all current subscribers.
    /// Sending to a closed processor delivers to no one.
    pub fn send_message(&self, message: Message) {
        self.publish(Event::Message(message));
    }

    /// Merge a task event into storage, then publish it to all current
    /// subscribers. Sending to a closed processor still merges but
    /// delivers to no one.
    ///
    /// # Errors
    ///
    /// Returns the storage error unchanged; the event is not published
    /// when the merge fails.
    pub async fn send_task_event(&self, event: TaskEvent) -> Result<()> {
        self.store.update(&event).await?;
        self.publish(Event::Task(event));
        Ok(())
    }

    /// End the stream for all current and future subscribers. Idempotent;
    /// subscribers observe a clean end-of-stream, not an error.
    pub fn close(&self) {
        let mut subscribers = self.subscribers.lock();
        if !subscribers.closed {
            subscribers.closed = true;
            subscribers.senders.clear();
            debug!(task_id = %self.task_id, "event processor closed");
        }
    }

    /// Whether [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.subscribers.lock().closed
    }

    fn publish(&self, event: Event) {
        let mut subscribers = self.subscribers.lock();
        if subscribers.closed {
            return;
        }
        // A failed send means the subscriber dropped its stream; prune it.
        subscribers
            .senders
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}
