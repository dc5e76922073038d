//! Session registry, per-task lock table, and completion monitors.
//!
//! The registry holds exactly the sessions whose jobs are currently
//! executing. Finalization of a task — registry removal plus session
//! close — is serialized through the per-task lock so exactly one of the
//! automatic completion monitor and an explicit cancel performs it.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{RwLock, Semaphore};
use tracing::{debug, warn};

use crate::models::event::Event;
use crate::persistence::{PushConfigStore, TaskStore};
use crate::push::PushSender;
use crate::{AppError, Result};

use super::event_processor::EventStream;
use super::session::Session;

/// One lazily-created entry in the per-task lock table.
///
/// `lockers` counts everyone between lock intent and unlock — holders and
/// waiters both — so the entry is only removed once nobody references it.
struct TaskLockEntry {
    permits: Semaphore,
    lockers: AtomicUsize,
}

/// Releases a held per-task lock on every exit path, including panics and
/// future cancellation.
struct UnlockGuard<'a> {
    manager: &'a SessionManager,
    task_id: &'a str,
}

impl Drop for UnlockGuard<'_> {
    fn drop(&mut self) {
        self.manager.task_unlock(self.task_id);
    }
}

/// The concurrency core: owns the registry of active sessions keyed by
/// task id and the per-task lock table guarding finalization.
pub struct SessionManager {
    // Many concurrent lookups, exclusive insert/remove.
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    // Independent layer: serializes finalization of a single task between
    // the completion monitor and an explicit cancel.
    locks: Mutex<HashMap<String, Arc<TaskLockEntry>>>,
    task_store: Arc<dyn TaskStore>,
    push_store: Arc<dyn PushConfigStore>,
    push_sender: Arc<dyn PushSender>,
}

impl SessionManager {
    /// Build a manager over the given collaborators.
    #[must_use]
    pub fn new(
        task_store: Arc<dyn TaskStore>,
        push_store: Arc<dyn PushConfigStore>,
        push_sender: Arc<dyn PushSender>,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            locks: Mutex::new(HashMap::new()),
            task_store,
            push_store,
            push_sender,
        }
    }

    /// Register a session and spawn its completion monitor.
    ///
    /// The check-and-insert is atomic under the registry write lock; a
    /// duplicate task id fails before any work starts and must not be
    /// retried as if it were transient. The monitor subscribes to the
    /// session's events before this call returns, so it observes the
    /// first event even though the caller starts the job afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::UnsupportedOperation`] when a session for the
    /// same task id is already registered.
    pub async fn add_session(self: &Arc<Self>, session: Arc<Session>) -> Result<()> {
        {
            let mut sessions = self.sessions.write().await;
            if sessions.contains_key(session.task_id()) {
                return Err(AppError::UnsupportedOperation(format!(
                    "task {} already has a running session",
                    session.task_id()
                )));
            }
            sessions.insert(session.task_id().to_owned(), Arc::clone(&session));
        }
        let events = session.processor().subscribe();
        debug!(task_id = %session.task_id(), "session registered");
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            manager.monitor(session, events).await;
        });
        Ok(())
    }

    /// The live session for a task, when one is executing.
    pub async fn session_for_task(&self, task_id: &str) -> Option<Arc<Session>> {
        self.sessions.read().await.get(task_id).cloned()
    }

    /// Number of currently registered sessions.
    pub async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Acquire the per-task lock, creating its entry on first use.
    ///
    /// Not reentrant: a holder that locks the same task id again
    /// deadlocks. One logical flow must acquire each lock at most once.
    pub async fn task_lock(&self, task_id: &str) {
        let entry = {
            let mut locks = self.locks.lock();
            let entry = locks.entry(task_id.to_owned()).or_insert_with(|| {
                Arc::new(TaskLockEntry {
                    permits: Semaphore::new(1),
                    lockers: AtomicUsize::new(0),
                })
            });
            entry.lockers.fetch_add(1, Ordering::Relaxed);
            Arc::clone(entry)
        };
        match entry.permits.acquire().await {
            Ok(permit) => permit.forget(),
            Err(_) => unreachable!("task lock semaphore is never closed"),
        };
    }

    /// Release the per-task lock, dropping its entry once no holder or
    /// waiter references it.
    ///
    /// # Panics
    ///
    /// Panics when `task_id` is not currently locked — a lock-discipline
    /// violation is a programmer error, never surfaced to clients.
    pub fn task_unlock(&self, task_id: &str) {
        let mut locks = self.locks.lock();
        let entry = match locks.get(task_id) {
            Some(entry) => Arc::clone(entry),
            None => panic!("task {task_id} is not locked"),
        };
        assert!(
            entry.permits.available_permits() == 0,
            "task {task_id} is not locked"
        );
        entry.permits.add_permits(1);
        if entry.lockers.fetch_sub(1, Ordering::Relaxed) == 1 {
            locks.remove(task_id);
        }
    }

    /// Whether the per-task lock is currently held.
    #[must_use]
    pub fn is_task_locked(&self, task_id: &str) -> bool {
        self.locks
            .lock()
            .get(task_id)
            .is_some_and(|entry| entry.permits.available_permits() == 0)
    }

    /// Run `action` under the per-task lock, releasing it on every exit
    /// path.
    pub async fn with_task_lock<F, Fut, T>(&self, task_id: &str, action: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.task_lock(task_id).await;
        let _guard = UnlockGuard {
            manager: self,
            task_id,
        };
        action().await
    }

    /// One monitor runs per registered session: it waits for the job to
    /// finish, finalizes under the per-task lock, and fires push
    /// notifications for task-linked sessions.
    async fn monitor(self: Arc<Self>, session: Arc<Session>, mut events: EventStream) {
        // Only the very first event decides whether this session was
        // task-linked; the subscription is dropped right after so events
        // do not pile up here.
        let first_is_task = matches!(events.recv().await, Some(Event::Task(_)));
        drop(events);

        // Job completion never raises, whatever the outcome was.
        session.join().await;

        let task_id = session.task_id().to_owned();
        self.with_task_lock(&task_id, || async {
            self.sessions.write().await.remove(&task_id);
            session.close().await;
        })
        .await;
        debug!(task_id, "session finalized");

        if first_is_task {
            self.notify_completion(&task_id).await;
        }
    }

    /// Deliver the final task snapshot to every configured push target.
    /// Delivery failures are logged and skipped; the monitor never
    /// crashes over them.
    async fn notify_completion(&self, task_id: &str) {
        let configs = match self.push_store.get_all(task_id).await {
            Ok(configs) => configs,
            Err(err) => {
                warn!(task_id, %err, "failed to load push configs");
                return;
            }
        };
        if configs.is_empty() {
            return;
        }
        let task = match self.task_store.get(task_id, Some(0), false).await {
            Ok(Some(task)) => task,
            Ok(None) => {
                warn!(task_id, "task missing at notification time");
                return;
            }
            Err(err) => {
                warn!(task_id, %err, "failed to load final task snapshot");
                return;
            }
        };
        for entry in configs {
            if let Err(err) = self.push_sender.send(&entry.config, &task).await {
                warn!(task_id, %err, "push delivery failed");
            }
        }
    }
}
