//! Push-notification configuration storage contract and in-memory
//! reference implementation.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::models::push::TaskPushConfig;
use crate::Result;

/// Storage collaborator owning per-task push-notification registrations.
pub trait PushConfigStore: Send + Sync {
    /// Register or replace a push target for a task. A config without an
    /// id is assigned one; a config with an existing id replaces that
    /// registration. Returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`](crate::AppError::Storage) when the
    /// backend fails.
    fn set(
        &self,
        config: &TaskPushConfig,
    ) -> Pin<Box<dyn Future<Output = Result<TaskPushConfig>> + Send + '_>>;

    /// Look up one registration by task and config id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`](crate::AppError::Storage) when the
    /// backend fails.
    fn get(
        &self,
        task_id: &str,
        config_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<TaskPushConfig>>> + Send + '_>>;

    /// All registrations for a task.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`](crate::AppError::Storage) when the
    /// backend fails.
    fn get_all(
        &self,
        task_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<TaskPushConfig>>> + Send + '_>>;

    /// Remove one registration. Removing an unknown id is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`](crate::AppError::Storage) when the
    /// backend fails.
    fn delete(
        &self,
        task_id: &str,
        config_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Reference implementation backed by a process-local map.
#[derive(Default)]
pub struct InMemoryPushConfigStore {
    configs: Mutex<HashMap<String, Vec<TaskPushConfig>>>,
}

impl InMemoryPushConfigStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PushConfigStore for InMemoryPushConfigStore {
    fn set(
        &self,
        config: &TaskPushConfig,
    ) -> Pin<Box<dyn Future<Output = Result<TaskPushConfig>> + Send + '_>> {
        let mut record = config.clone();
        Box::pin(async move {
            if record.config.id.is_none() {
                record.config.id = Some(Uuid::new_v4().to_string());
            }
            let mut configs = self.configs.lock();
            let entries = configs.entry(record.task_id.clone()).or_default();
            if let Some(slot) = entries.iter_mut().find(|e| e.config.id == record.config.id) {
                *slot = record.clone();
            } else {
                entries.push(record.clone());
            }
            Ok(record)
        })
    }

    fn get(
        &self,
        task_id: &str,
        config_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<TaskPushConfig>>> + Send + '_>> {
        let task_id = task_id.to_owned();
        let config_id = config_id.to_owned();
        Box::pin(async move {
            let configs = self.configs.lock();
            Ok(configs.get(&task_id).and_then(|entries| {
                entries
                    .iter()
                    .find(|e| e.config.id.as_deref() == Some(config_id.as_str()))
                    .cloned()
            }))
        })
    }

    fn get_all(
        &self,
        task_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<TaskPushConfig>>> + Send + '_>> {
        let task_id = task_id.to_owned();
        Box::pin(async move {
            let configs = self.configs.lock();
            Ok(configs.get(&task_id).cloned().unwrap_or_default())
        })
    }

    fn delete(
        &self,
        task_id: &str,
        config_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let task_id = task_id.to_owned();
        let config_id = config_id.to_owned();
        Box::pin(async move {
            let mut configs = self.configs.lock();
            if let Some(entries) = configs.get_mut(&task_id) {
                entries.retain(|e| e.config.id.as_deref() != Some(config_id.as_str()));
                if entries.is_empty() {
                    configs.remove(&task_id);
                }
            }
            Ok(())
        })
    }
}
