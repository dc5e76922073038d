//! Task storage contract and in-memory reference implementation.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use parking_lot::Mutex;

use crate::models::event::TaskEvent;
use crate::models::task::Task;
use crate::Result;

/// Storage collaborator owning task snapshots.
///
/// The concurrency core never mutates tasks directly; all writes flow
/// through [`TaskStore::update`] as events, and reads return merged
/// snapshots.
pub trait TaskStore: Send + Sync {
    /// Load a task snapshot.
    ///
    /// `history_length` limits the returned history to the most recent
    /// `n` entries (`None` keeps all); `include_artifacts` controls
    /// whether artifacts are returned.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`](crate::AppError::Storage) when the
    /// backend fails.
    fn get(
        &self,
        task_id: &str,
        history_length: Option<usize>,
        include_artifacts: bool,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Task>>> + Send + '_>>;

    /// Merge a task event into the stored snapshot, creating the task on
    /// first contact with an unknown id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`](crate::AppError::Storage) when the
    /// backend fails.
    fn update(&self, event: &TaskEvent) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Reference implementation backed by a process-local map.
#[derive(Default)]
pub struct InMemoryTaskStore {
    tasks: Mutex<HashMap<String, Task>>,
}

impl InMemoryTaskStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskStore for InMemoryTaskStore {
    fn get(
        &self,
        task_id: &str,
        history_length: Option<usize>,
        include_artifacts: bool,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Task>>> + Send + '_>> {
        let task_id = task_id.to_owned();
        Box::pin(async move {
            let tasks = self.tasks.lock();
            let Some(task) = tasks.get(&task_id) else {
                return Ok(None);
            };
            let mut snapshot = task.clone();
            snapshot.trim_history(history_length);
            if !include_artifacts {
                snapshot.artifacts.clear();
            }
            Ok(Some(snapshot))
        })
    }

    fn update(&self, event: &TaskEvent) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let event = event.clone();
        Box::pin(async move {
            let mut tasks = self.tasks.lock();
            match event {
                TaskEvent::Snapshot(task) => {
                    tasks.insert(task.id.clone(), task);
                }
                TaskEvent::Status(update) => {
                    let task = tasks
                        .entry(update.task_id.clone())
                        .or_insert_with(|| Task::new(update.task_id.clone(), update.context_id.clone()));
                    task.apply_status(update.status);
                }
                TaskEvent::Artifact(update) => {
                    let task = tasks
                        .entry(update.task_id.clone())
                        .or_insert_with(|| Task::new(update.task_id.clone(), update.context_id.clone()));
                    task.apply_artifact(update.artifact, update.append);
                }
            }
            Ok(())
        })
    }
}
